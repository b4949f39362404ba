use super::*;
use crate::builder::{ConstraintBuilder, ParameterSite, Site, SlotRef};
use crate::descriptor::{ClassDescriptor, TypeDescriptor};
use crate::environment::TypeEnvironment;
use crate::format::TypeFormatter;
use crate::variables::ConstraintVariableFactory;

fn zoo() -> TypeEnvironment {
    let env = TypeEnvironment::new();
    env.declare_class(ClassDescriptor::interface("zoo.Pet")).unwrap();
    env.declare_class(ClassDescriptor::class("zoo.Animal")).unwrap();
    env.declare_class(
        ClassDescriptor::class("zoo.Dog")
            .extends(class("zoo.Animal"))
            .implements(class("zoo.Pet")),
    )
    .unwrap();
    env.declare_class(
        ClassDescriptor::class("zoo.Cat")
            .extends(class("zoo.Animal"))
            .implements(class("zoo.Pet")),
    )
    .unwrap();
    env.declare_class(ClassDescriptor::class("garage.Car")).unwrap();
    env.declare_class(
        ClassDescriptor::interface("java.util.List")
            .with_type_parameter(crate::descriptor::TypeParameterDescriptor::new("E")),
    )
    .unwrap();
    env
}

fn class(name: &str) -> TypeDescriptor {
    TypeDescriptor::class(name)
}

fn list_of(arg: TypeDescriptor) -> TypeDescriptor {
    TypeDescriptor::parameterized("java.util.List", vec![arg])
}

fn declare(binding: &str, site: u32, ty: TypeDescriptor, initializer: Option<u32>) -> Site {
    Site::Declaration {
        binding: binding.to_string(),
        site,
        ty,
        initializer,
        declaring: None,
    }
}

fn expression(site: u32, ty: TypeDescriptor) -> Site {
    Site::Expression { site, ty: Some(ty) }
}

fn require(binding: &str, expected: TypeDescriptor, relation: ConstraintOperator) -> Site {
    Site::Requirement {
        subject: SlotRef::Binding(binding.to_string()),
        expected,
        relation,
    }
}

fn format(env: &TypeEnvironment, ty: Option<TypeId>) -> Option<String> {
    ty.map(|ty| TypeFormatter::new(env).format(ty))
}

#[test]
fn test_compatible_requirement_is_solved_unchanged() {
    let env = zoo();
    let sites = vec![
        declare("x", 1, class("zoo.Dog"), None),
        require("x", class("zoo.Animal"), ConstraintOperator::Subtype),
    ];
    let graph = ConstraintBuilder::new().build(&env, &sites);
    let x = graph.find_binding("x").unwrap();

    let mut solver = ConstraintSolver::new(&graph);
    assert_eq!(solver.state(), SolverState::Unsolved);
    assert_eq!(solver.run(), SolverState::Solved);
    assert_eq!(solver.run(), SolverState::Solved);
    assert_eq!(format(&env, solver.assignment().get(x)).as_deref(), Some("Dog"));

    let assignment = solve(&graph).unwrap();
    assert_eq!(assignment.get(x), env.class_type("zoo.Dog").ok());
}

#[test]
fn test_unrelated_requirement_is_unsatisfiable() {
    let env = zoo();
    let sites = vec![
        declare("x", 1, class("zoo.Dog"), None),
        require("x", class("garage.Car"), ConstraintOperator::Subtype),
    ];
    let mut graph = ConstraintBuilder::new().build(&env, &sites);
    let x = graph.find_binding("x").unwrap();
    let car = graph.resolved_type_variable(env.class_type("garage.Car").unwrap());

    let report = solve(&graph).unwrap_err();
    assert_eq!(report.first, SimpleConstraint::subtype(x, car));
    assert_eq!(report.conflicts.len(), 1);
    assert_eq!(
        report.conflicts[0].failure,
        Some(AssignabilityFailure::UnrelatedTypes)
    );
    assert_eq!(report.partial.get(x), env.class_type("zoo.Dog").ok());
    assert!(report.to_string().starts_with("1 unsatisfiable constraint(s)"));
}

#[test]
fn test_equality_uses_wildcard_containment() {
    let env = zoo();
    let covariant = vec![
        declare("x", 1, list_of(class("zoo.Dog")), None),
        require(
            "x",
            list_of(TypeDescriptor::extends(class("zoo.Animal"))),
            ConstraintOperator::Equal,
        ),
    ];
    let graph = ConstraintBuilder::new().build(&env, &covariant);
    assert!(solve(&graph).is_ok());

    let invariant = vec![
        declare("y", 2, list_of(class("zoo.Dog")), None),
        require("y", list_of(class("zoo.Animal")), ConstraintOperator::Equal),
    ];
    let graph = ConstraintBuilder::new().build(&env, &invariant);
    let report = solve(&graph).unwrap_err();
    assert_eq!(
        report.conflicts[0].failure,
        Some(AssignabilityFailure::TypeArgumentMismatch { index: 0 })
    );
}

#[test]
fn test_strict_subtype() {
    let env = zoo();
    let strict = |expected: &str| {
        let sites = vec![
            declare("x", 1, class("zoo.Dog"), None),
            require("x", class(expected), ConstraintOperator::StrictSubtype),
        ];
        let graph = ConstraintBuilder::new().build(&env, &sites);
        solve(&graph).is_ok()
    };
    assert!(strict("zoo.Animal"));
    assert!(!strict("zoo.Dog"));
}

#[test]
fn test_every_conflict_is_listed() {
    let env = zoo();
    let sites = vec![
        declare("x", 1, class("zoo.Dog"), None),
        declare("y", 2, class("zoo.Cat"), None),
        require("x", class("garage.Car"), ConstraintOperator::Subtype),
        require("y", class("zoo.Dog"), ConstraintOperator::Subtype),
        require("y", class("zoo.Pet"), ConstraintOperator::Subtype),
    ];
    let graph = ConstraintBuilder::new().build(&env, &sites);

    let mut solver = ConstraintSolver::new(&graph);
    assert_eq!(solver.run(), SolverState::Unsatisfiable);
    assert_eq!(solver.conflicts().len(), 2);
    let report = solver.into_result().unwrap_err();
    assert_eq!(report.first, report.conflicts[0].edge);
}

#[test]
fn test_unresolved_variables_are_skipped() {
    let env = zoo();
    let sites = vec![
        declare("x", 1, class("zoo.Unicorn"), None),
        require("x", class("garage.Car"), ConstraintOperator::Subtype),
    ];
    let graph = ConstraintBuilder::new().build(&env, &sites);
    let x = graph.find_binding("x").unwrap();

    let assignment = solve(&graph).unwrap();
    assert_eq!(assignment.get(x), None);
}

#[test]
fn test_unresolved_members_take_the_class_type() {
    let env = zoo();
    let sites = vec![
        Site::Reference {
            site: 7,
            binding: "x".to_string(),
        },
        declare("x", 1, class("zoo.Dog"), None),
        Site::Requirement {
            subject: SlotRef::Site(7),
            expected: class("garage.Car"),
            relation: ConstraintOperator::Subtype,
        },
    ];
    let mut graph = ConstraintBuilder::new().build(&env, &sites);
    let reference = graph.expression_variable(7, None);

    let report = solve(&graph).unwrap_err();
    assert_eq!(report.first.left, reference);
    assert_eq!(report.partial.get(reference), env.class_type("zoo.Dog").ok());
}

#[test]
fn test_free_variable_widens_to_least_common_supertype() {
    let env = zoo();
    let sites = vec![
        expression(1, class("zoo.Dog")),
        expression(2, class("zoo.Cat")),
        declare("x", 10, class("zoo.Dog"), Some(1)),
        Site::Reference {
            site: 3,
            binding: "x".to_string(),
        },
        Site::Assignment {
            target: 3,
            value: 2,
        },
    ];

    let fixed = ConstraintBuilder::new().build(&env, &sites);
    assert!(solve(&fixed).is_err());

    let graph = ConstraintBuilder::new()
        .with_free_binding("x")
        .build(&env, &sites);
    let x = graph.find_binding("x").unwrap();
    let assignment = solve(&graph).unwrap();
    // Animal and Pet are equally close; Animal comes first in declaration
    // order and neither was observed.
    assert_eq!(format(&env, assignment.get(x)).as_deref(), Some("Animal"));
    // The reference and the declared type follow the binding.
    let reference = graph.factory().find(crate::variables::VariableSite::Expression(3)).unwrap();
    assert_eq!(assignment.get(reference), assignment.get(x));
}

#[test]
fn test_observation_order_breaks_ties() {
    let env = zoo();
    let sites = vec![
        expression(9, class("zoo.Pet")),
        expression(1, class("zoo.Dog")),
        expression(2, class("zoo.Cat")),
        Site::Conditional {
            site: 5,
            branches: vec![1, 2],
        },
        declare("x", 10, class("zoo.Dog"), Some(5)),
    ];
    let graph = ConstraintBuilder::new()
        .with_free_binding("x")
        .build(&env, &sites);
    let x = graph.find_binding("x").unwrap();
    let mut graph = graph;
    let conditional = graph.expression_variable(5, None);
    graph.mark_free(conditional);

    let assignment = solve(&graph).unwrap();
    assert_eq!(format(&env, assignment.get(conditional)).as_deref(), Some("Pet"));
    assert_eq!(format(&env, assignment.get(x)).as_deref(), Some("Pet"));
}

#[test]
fn test_free_variable_keeps_seed_when_it_fits() {
    let env = zoo();
    let sites = vec![
        declare("x", 1, class("zoo.Dog"), None),
        require("x", class("zoo.Animal"), ConstraintOperator::Subtype),
    ];
    let graph = ConstraintBuilder::new()
        .with_free_binding("x")
        .build(&env, &sites);
    let x = graph.find_binding("x").unwrap();

    let mut solver = ConstraintSolver::new(&graph);
    assert_eq!(solver.run(), SolverState::Solved);
    assert_eq!(solver.assignment().get(x), env.class_type("zoo.Dog").ok());

    let widenings: Vec<String> = solver
        .valid_widenings(x)
        .into_iter()
        .map(|ty| TypeFormatter::new(&env).format(ty))
        .collect();
    assert_eq!(widenings, vec!["Dog", "Animal"]);
}

#[test]
fn test_valid_widenings_without_constraints_is_the_closure() {
    let env = zoo();
    let sites = vec![declare("x", 1, class("zoo.Dog"), None)];
    let graph = ConstraintBuilder::new().build(&env, &sites);
    let x = graph.find_binding("x").unwrap();

    let mut solver = ConstraintSolver::new(&graph);
    let widenings: Vec<String> = solver
        .valid_widenings(x)
        .into_iter()
        .map(|ty| TypeFormatter::new(&env).with_qualified_names(true).format(ty))
        .collect();
    assert_eq!(widenings, vec!["zoo.Dog", "zoo.Animal", "zoo.Pet", "java.lang.Object"]);
    assert_eq!(solver.state(), SolverState::Solved);
}

#[test]
fn test_composite_or_settles_on_any_member() {
    let env = zoo();
    let cast = |operand: &str| {
        let sites = vec![
            expression(1, class(operand)),
            Site::Cast {
                site: 2,
                operand: 1,
                ty: class("zoo.Dog"),
            },
        ];
        let graph = ConstraintBuilder::new().build(&env, &sites);
        solve(&graph)
    };
    assert!(cast("zoo.Animal").is_ok());
    assert!(cast("zoo.Dog").is_ok());

    let report = cast("garage.Car").unwrap_err();
    assert_eq!(report.conflicts.len(), 1);
    assert!(matches!(report.conflicts[0].constraint, Constraint::Or(_)));
}

#[test]
fn test_overload_resolution_through_disjunctions() {
    let env = zoo();
    let method = |name: &str, param: &str| Site::Method {
        method: name.to_string(),
        declaring: "zoo.Animal".to_string(),
        parameters: vec![ParameterSite {
            binding: format!("{name}#arg"),
            ty: class(param),
        }],
        return_type: Some(class("zoo.Animal")),
        overrides: Vec::new(),
    };
    let call = |argument: &str| {
        let sites = vec![
            method("zoo.Animal.meet(Dog)", "zoo.Dog"),
            method("zoo.Animal.meet(Cat)", "zoo.Cat"),
            expression(1, class(argument)),
            Site::Invocation {
                site: 2,
                candidates: vec![
                    "zoo.Animal.meet(Dog)".to_string(),
                    "zoo.Animal.meet(Cat)".to_string(),
                ],
                receiver: None,
                arguments: vec![1],
            },
        ];
        let graph = ConstraintBuilder::new().build(&env, &sites);
        solve(&graph).map(|_| ()).map_err(|report| report.conflicts.len())
    };
    assert_eq!(call("zoo.Cat"), Ok(()));
    assert_eq!(call("garage.Car"), Err(1));
}

#[test]
fn test_vacuous_disjunction() {
    let env = zoo();
    let mut graph = ConstraintGraph::new(&env);
    let a = graph.expression_variable(1, None);
    let b = graph.expression_variable(2, None);
    let dog = graph.resolved_type_variable(env.class_type("zoo.Dog").unwrap());
    graph.add_or([
        SimpleConstraint::subtype(a, dog).into(),
        SimpleConstraint::subtype(b, dog).into(),
    ]);

    assert!(solve(&graph).is_ok());
}

#[test]
fn test_solving_is_deterministic() {
    let env = zoo();
    let sites = vec![
        expression(1, class("zoo.Dog")),
        expression(2, class("zoo.Cat")),
        expression(3, class("garage.Car")),
        declare("x", 10, class("zoo.Dog"), Some(1)),
        declare("y", 11, class("zoo.Pet"), Some(2)),
        Site::Reference {
            site: 4,
            binding: "x".to_string(),
        },
        Site::Assignment {
            target: 4,
            value: 3,
        },
        Site::Conditional {
            site: 6,
            branches: vec![1, 2, 3],
        },
        require("y", class("zoo.Animal"), ConstraintOperator::Subtype),
    ];
    let run = || {
        let graph = ConstraintBuilder::new()
            .with_free_binding("x")
            .build(&env, &sites);
        let report = solve(&graph).unwrap_err();
        let conflicts: Vec<String> = report
            .conflicts
            .iter()
            .map(|c| format!("{} {:?} {:?}", c.constraint, c.left_type, c.right_type))
            .collect();
        let partial: Vec<_> = report.partial.iter().collect();
        (report.first, conflicts, partial)
    };

    let first = run();
    for _ in 0..5 {
        assert_eq!(run(), first);
    }
}

#[test]
fn test_propagation_step_limit() {
    let env = zoo();
    let sites = vec![
        expression(1, class("zoo.Dog")),
        expression(2, class("zoo.Cat")),
        declare("x", 10, class("zoo.Dog"), Some(1)),
        Site::Reference {
            site: 3,
            binding: "x".to_string(),
        },
        Site::Assignment {
            target: 3,
            value: 2,
        },
    ];
    let graph = ConstraintBuilder::new()
        .with_free_binding("x")
        .build(&env, &sites);

    let mut solver = ConstraintSolver::new(&graph);
    assert_eq!(solver.run(), SolverState::Solved);

    let mut limited = ConstraintSolver::with_options(
        &graph,
        SolverOptions::default()
            .with_max_steps(0)
            .with_explanations(false),
    );
    assert_eq!(limited.run(), SolverState::Unsatisfiable);
    assert!(limited.conflicts().iter().all(|c| c.failure.is_none()));
}

#[test]
fn test_free_variable_equal_to_unrelated_type_is_unsatisfiable() {
    let env = zoo();
    let sites = vec![
        declare("x", 1, class("zoo.Dog"), None),
        require("x", class("garage.Car"), ConstraintOperator::Equal),
    ];
    let mut graph = ConstraintBuilder::new()
        .with_free_binding("x")
        .build(&env, &sites);
    let x = graph.find_binding("x").unwrap();
    let car = graph.resolved_type_variable(env.class_type("garage.Car").unwrap());

    let mut solver = ConstraintSolver::new(&graph);
    assert_eq!(solver.run(), SolverState::Unsatisfiable);
    assert_eq!(format(&env, solver.assignment().get(x)).as_deref(), Some("Dog"));
    assert_eq!(format(&env, solver.assignment().get(car)).as_deref(), Some("Car"));
    assert_eq!(solver.conflicts()[0].edge, SimpleConstraint::equal(x, car));
}

#[test]
fn test_free_variable_equal_to_supertype_takes_that_type() {
    let env = zoo();
    let sites = vec![
        declare("x", 1, class("zoo.Dog"), None),
        require("x", class("zoo.Animal"), ConstraintOperator::Equal),
    ];
    let mut graph = ConstraintBuilder::new()
        .with_free_binding("x")
        .build(&env, &sites);
    let x = graph.find_binding("x").unwrap();
    let animal = graph.resolved_type_variable(env.class_type("zoo.Animal").unwrap());

    let mut solver = ConstraintSolver::new(&graph);
    assert_eq!(solver.run(), SolverState::Solved);
    assert_eq!(format(&env, solver.assignment().get(x)).as_deref(), Some("Animal"));
    assert_eq!(solver.assignment().get(animal), solver.assignment().get(x));

    let widenings: Vec<String> = solver
        .valid_widenings(x)
        .into_iter()
        .map(|ty| TypeFormatter::new(&env).format(ty))
        .collect();
    assert_eq!(widenings, vec!["Animal"]);
}

#[test]
fn test_equal_type_must_fit_the_initializer() {
    let env = zoo();
    let sites = vec![
        expression(1, class("zoo.Cat")),
        declare("y", 10, class("zoo.Dog"), Some(1)),
        require("y", class("zoo.Animal"), ConstraintOperator::Equal),
    ];
    let graph = ConstraintBuilder::new()
        .with_free_binding("y")
        .build(&env, &sites);
    let y = graph.find_binding("y").unwrap();
    assert_eq!(format(&env, solve(&graph).unwrap().get(y)).as_deref(), Some("Animal"));

    let sites = vec![
        expression(1, class("zoo.Cat")),
        declare("y", 10, class("zoo.Dog"), Some(1)),
        require("y", class("zoo.Pet"), ConstraintOperator::Equal),
        require("y", class("zoo.Animal"), ConstraintOperator::Subtype),
    ];
    let graph = ConstraintBuilder::new()
        .with_free_binding("y")
        .build(&env, &sites);
    assert!(solve(&graph).is_err());
}

fn two_sessions() -> (TypeEnvironment, TypeEnvironment) {
    let (first, second) = (zoo(), zoo());
    assert_ne!(first.stamp(), second.stamp());
    (first, second)
}

#[test]
#[should_panic(expected = "belongs to another TypeEnvironment")]
fn test_graph_rejects_variable_of_another_environment() {
    let (env_a, env_b) = two_sessions();
    let graph_a = ConstraintBuilder::new().build(&env_a, &[declare("a", 1, class("zoo.Dog"), None)][..]);
    let graph_b = ConstraintBuilder::new().build(&env_b, &[declare("b", 1, class("garage.Car"), None)][..]);
    let a = graph_a.find_binding("a").unwrap();
    assert!(a.index() < graph_b.variables().len());

    graph_b.describe(a);
}

#[test]
#[should_panic(expected = "belongs to another TypeEnvironment")]
fn test_solver_rejects_variable_of_another_environment() {
    let (env_a, env_b) = two_sessions();
    let graph_a = ConstraintBuilder::new().build(&env_a, &[declare("a", 1, class("zoo.Dog"), None)][..]);
    let graph_b = ConstraintBuilder::new().build(&env_b, &[declare("b", 1, class("garage.Car"), None)][..]);
    let a = graph_a.find_binding("a").unwrap();

    let mut solver = ConstraintSolver::new(&graph_b);
    solver.valid_widenings(a);
}
