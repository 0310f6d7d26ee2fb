use std::collections::HashMap;

use transship_model::{
    BuildOptions, FlowSolution, NodeCounts, NodeRole, PricingRule, SolutionStatus, Solver, TransshipmentProblem, solve,
};

const EPS: f64 = 1e-6;

fn problem(
    counts: NodeCounts,
    supply: &[f64],
    demand: &[f64],
    costs: &[((usize, usize), f64)],
) -> TransshipmentProblem {
    let costs: HashMap<(usize, usize), f64> = costs.iter().copied().collect();
    TransshipmentProblem::from_parts(counts, supply.to_vec(), demand.to_vec(), &costs).unwrap()
}

fn solve_default(problem: &TransshipmentProblem) -> FlowSolution {
    solve(problem, &BuildOptions::default(), &Solver::new()).unwrap()
}

/// Balance, conservation and cost correctness of an optimal solution
fn assert_consistent(problem: &TransshipmentProblem, solution: &FlowSolution) {
    assert_eq!(solution.status, SolutionStatus::Optimal);
    let counts = problem.counts();

    for node in counts.nodes(NodeRole::Intermediate) {
        let (inflow, outflow) = (solution.inflow(node), solution.outflow(node));
        assert!((inflow - outflow).abs() < EPS, "node {}: in {} out {}", node, inflow, outflow);
    }
    for (i, node) in counts.nodes(NodeRole::Supply).enumerate() {
        let out = solution.outflow(node);
        assert!((out - problem.supplies()[i]).abs() < EPS, "supply node {}: {}", node, out);
    }
    for (i, node) in counts.nodes(NodeRole::Demand).enumerate() {
        let inflow = solution.inflow(node);
        assert!((inflow - problem.demands()[i]).abs() < EPS, "demand node {}: {}", node, inflow);
    }

    let shipped: f64 = counts.nodes(NodeRole::Supply).map(|n| solution.outflow(n)).sum();
    let received: f64 = counts.nodes(NodeRole::Demand).map(|n| solution.inflow(n)).sum();
    assert!((shipped - received).abs() < EPS);
    assert!((shipped - problem.total_supply()).abs() < EPS);

    let recomputed: f64 = solution
        .flows
        .iter()
        .map(|f| f.flow * problem.cost(f.from, f.to).unwrap_or(0.0))
        .sum();
    let total = solution.total_cost.unwrap();
    assert!((total - recomputed).abs() < EPS, "total {} recomputed {}", total, recomputed);

    assert!(solution.flows.iter().all(|f| f.flow >= 0.0));
}

#[test]
fn scenario_a_single_path() {
    let p = problem(NodeCounts::new(1, 1, 1), &[10.0], &[10.0], &[((1, 2), 2.0), ((2, 3), 3.0)]);
    let solution = solve_default(&p);

    assert_consistent(&p, &solution);
    assert!((solution.flow(1, 2).unwrap() - 10.0).abs() < EPS);
    assert!((solution.flow(2, 3).unwrap() - 10.0).abs() < EPS);
    assert!((solution.total_cost.unwrap() - 50.0).abs() < EPS);
}

#[test]
fn scenario_b_unbalanced_is_infeasible() {
    let p = problem(
        NodeCounts::new(2, 1, 1),
        &[6.0, 4.0],
        &[8.0],
        &[((1, 3), 1.0), ((2, 3), 1.0), ((3, 4), 1.0)],
    );

    for check_balance in [true, false] {
        let options = BuildOptions::new().with_balance_check(check_balance);
        let solution = solve(&p, &options, &Solver::new()).unwrap();

        assert_eq!(solution.status, SolutionStatus::Infeasible, "check_balance = {}", check_balance);
        assert!(solution.flows.is_empty());
        assert_eq!(solution.total_cost, None);
    }
}

#[test]
fn scenario_c_equal_costs() {
    // supply 1,2; intermediate 3; demand 4,5
    let p = problem(
        NodeCounts::new(2, 1, 2),
        &[5.0, 5.0],
        &[4.0, 6.0],
        &[((1, 3), 1.0), ((2, 3), 1.0), ((3, 4), 1.0), ((3, 5), 1.0)],
    );
    let solution = solve_default(&p);

    assert_consistent(&p, &solution);
    // Every unit crosses exactly two unit-cost arcs
    assert!((solution.total_cost.unwrap() - 20.0).abs() < EPS);
}

#[test]
fn routes_through_cheapest_intermediate() {
    // supply 1 (6), 2 (4); intermediate 3, 4; demand 5 (5), 6 (5)
    let p = problem(
        NodeCounts::new(2, 2, 2),
        &[6.0, 4.0],
        &[5.0, 5.0],
        &[
            ((1, 3), 1.0),
            ((1, 4), 4.0),
            ((2, 3), 3.0),
            ((2, 4), 1.0),
            ((3, 5), 2.0),
            ((3, 6), 5.0),
            ((4, 5), 4.0),
            ((4, 6), 1.0),
        ],
    );

    for pricing in [PricingRule::Bland, PricingRule::Dantzig] {
        let solution = solve(&p, &BuildOptions::default(), &Solver::new().with_pricing(pricing)).unwrap();

        assert_consistent(&p, &solution);
        assert!((solution.total_cost.unwrap() - 28.0).abs() < EPS, "{:?}", pricing);
        let expected = [
            ((1, 3), 5.0),
            ((1, 4), 1.0),
            ((2, 3), 0.0),
            ((2, 4), 4.0),
            ((3, 5), 5.0),
            ((3, 6), 0.0),
            ((4, 5), 0.0),
            ((4, 6), 5.0),
        ];
        for ((from, to), flow) in expected {
            let got = solution.flow(from, to).unwrap();
            assert!((got - flow).abs() < EPS, "{:?}: flow {}->{} = {} (expected {})", pricing, from, to, got, flow);
        }
    }
}

#[test]
fn reduced_costs_certify_optimality() {
    let p = problem(
        NodeCounts::new(3, 2, 2),
        &[4.0, 3.0, 5.0],
        &[7.0, 5.0],
        &[
            ((1, 4), 2.0),
            ((1, 5), 6.0),
            ((2, 4), 3.0),
            ((2, 5), 1.0),
            ((3, 4), 4.0),
            ((3, 5), 2.0),
            ((4, 6), 3.0),
            ((4, 7), 5.0),
            ((5, 6), 4.0),
            ((5, 7), 1.0),
        ],
    );
    let solution = solve_default(&p);

    assert_consistent(&p, &solution);
    for f in &solution.flows {
        assert!(f.reduced_cost >= -EPS, "arc {}->{} reduced cost {}", f.from, f.to, f.reduced_cost);
        if f.flow > EPS {
            assert!(f.reduced_cost.abs() < EPS, "used arc {}->{} has reduced cost {}", f.from, f.to, f.reduced_cost);
        }
    }
    assert_eq!(solution.prices.len(), 7);
}

#[test]
fn zero_supply_is_optimal_with_no_flow() {
    let costs = [((1, 2), 1.0), ((1, 3), 1.0), ((2, 4), 1.0), ((3, 4), 1.0)];
    let p = problem(NodeCounts::new(1, 2, 1), &[0.0], &[0.0], &costs);
    let solution = solve_default(&p);

    assert_consistent(&p, &solution);
    assert_eq!(solution.total_cost, Some(0.0));
    assert_eq!(solution.nonzero_flows().count(), 0);
}

#[test]
fn no_intermediate_nodes_cannot_ship() {
    let p = problem(NodeCounts::new(1, 0, 1), &[3.0], &[3.0], &[]);
    let solution = solve_default(&p);

    assert_eq!(solution.status, SolutionStatus::Infeasible);
}

#[test]
fn solving_twice_is_identical() {
    let p = problem(
        NodeCounts::new(2, 2, 2),
        &[5.0, 5.0],
        &[3.0, 7.0],
        &[
            ((1, 3), 1.0),
            ((1, 4), 1.0),
            ((2, 3), 1.0),
            ((2, 4), 1.0),
            ((3, 5), 1.0),
            ((3, 6), 1.0),
            ((4, 5), 1.0),
            ((4, 6), 1.0),
        ],
    );

    let first = solve_default(&p);
    let second = solve_default(&p);

    assert_eq!(first, second);
    assert_consistent(&p, &first);
}

#[test]
fn concurrent_solves_share_a_solver() {
    let solver = Solver::new();
    let p = problem(NodeCounts::new(1, 1, 1), &[10.0], &[10.0], &[((1, 2), 2.0), ((2, 3), 3.0)]);

    let results: Vec<FlowSolution> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| solve(&p, &BuildOptions::default(), &solver).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for solution in &results {
        assert_eq!(solution, &results[0]);
        assert_eq!(solution.total_cost, Some(50.0));
    }
}
