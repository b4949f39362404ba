use anyhow::{Context, Result};
use tracing::{debug, info_span};

use crate::args::{CliArgs, Command, OutputFormat};
use crate::program::Program;
use crate::reporter::{
    CheckReport, CheckStatus, ConflictReport, QueryReport, Reporter, SolveReport, SolveStatus,
    VariableReport, WideningReport, render_json,
};
use tycon_solver::{
    ConstraintBuilder, ConstraintSolver, SolverOptions, SolverState, TypeFormatter,
    can_assign_to, explain_assignability,
};

/// Exit status codes of the tycon binary.
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_MALFORMED_INPUT: u8 = 2;

/// Rendered output of one command and the status to exit with.
#[derive(Debug)]
pub struct Execution {
    pub output: String,
    pub exit_code: u8,
}

/// Run a parsed command line. Any `Err` means the input was malformed.
pub fn run(args: &CliArgs, color: bool) -> Result<Execution> {
    let reporter = Reporter::new(color);
    match &args.command {
        Command::Solve(solve) => {
            let program = Program::load(&solve.program)?;
            let mut options = SolverOptions::default();
            if let Some(max_steps) = solve.max_steps {
                options = options.with_max_steps(max_steps);
            }
            let report = solve_program(&program, &solve.widen, options, solve.qualified)?;
            let exit_code = match report.status {
                SolveStatus::Solved => EXIT_SUCCESS,
                SolveStatus::Unsatisfiable => EXIT_FAILURE,
            };
            let output = match solve.format {
                OutputFormat::Text => reporter.render_solve(&report),
                OutputFormat::Json => render_json(&report)?,
            };
            Ok(Execution { output, exit_code })
        }
        Command::Check(check) => {
            let program = Program::load(&check.program)?;
            let report = check_program(&program, check.qualified)?;
            let exit_code = match report.status {
                CheckStatus::Passed => EXIT_SUCCESS,
                CheckStatus::Failed => EXIT_FAILURE,
            };
            let output = match check.format {
                OutputFormat::Text => reporter.render_check(&report),
                OutputFormat::Json => render_json(&report)?,
            };
            Ok(Execution { output, exit_code })
        }
    }
}

/// Build and solve the program's constraints.
///
/// Bindings in `widen` are made free like the program's own `free` list, and
/// their valid widenings are reported. Naming a binding that no site declares
/// is an input error.
pub fn solve_program(
    program: &Program,
    widen: &[String],
    options: SolverOptions,
    qualified: bool,
) -> Result<SolveReport> {
    let _span = info_span!("solve_program", sites = program.sites.len()).entered();
    let env = program
        .environment()
        .context("invalid class declarations")?;
    let graph = ConstraintBuilder::new()
        .with_free_bindings(program.free.iter().chain(widen))
        .build(&env, program);
    debug!(
        variables = graph.variables().len(),
        constraints = graph.constraint_count(),
        "program translated"
    );

    let widened = widen
        .iter()
        .map(|binding| {
            graph
                .find_binding(binding)
                .map(|var| (binding, var))
                .with_context(|| format!("no site declares binding `{binding}`"))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut solver = ConstraintSolver::with_options(&graph, options);
    let state = solver.run();
    let formatter = TypeFormatter::new(&env).with_qualified_names(qualified);

    let variables = graph
        .variables()
        .iter()
        .map(|variable| VariableReport {
            id: variable.id.to_string(),
            slot: graph.describe(variable.id),
            ty: solver
                .assignment()
                .get(variable.id)
                .map(|ty| formatter.format(ty)),
            free: graph.is_free(variable.id),
        })
        .collect();

    let conflicts = solver
        .conflicts()
        .iter()
        .map(|conflict| ConflictReport {
            constraint: format!(
                "{} {} {}",
                graph.describe(conflict.edge.left),
                conflict.edge.op.symbol(),
                graph.describe(conflict.edge.right)
            ),
            left_type: formatter.format(conflict.left_type),
            right_type: formatter.format(conflict.right_type),
            reason: conflict
                .failure
                .as_ref()
                .map(|failure| failure.message(&formatter)),
        })
        .collect();

    let widenings = widened
        .into_iter()
        .map(|(binding, var)| WideningReport {
            binding: binding.clone(),
            candidates: solver
                .valid_widenings(var)
                .into_iter()
                .map(|ty| formatter.format(ty))
                .collect(),
        })
        .collect();

    let status = match state {
        SolverState::Solved => SolveStatus::Solved,
        _ => SolveStatus::Unsatisfiable,
    };
    Ok(SolveReport {
        status,
        variables,
        conflicts,
        widenings,
    })
}

/// Answer every query of the program.
pub fn check_program(program: &Program, qualified: bool) -> Result<CheckReport> {
    let env = program
        .environment()
        .context("invalid class declarations")?;
    let formatter = TypeFormatter::new(&env).with_qualified_names(qualified);

    let mut queries = Vec::with_capacity(program.queries.len());
    for (index, query) in program.queries.iter().enumerate() {
        let source = env
            .get_or_create(&query.source)
            .with_context(|| format!("query {index}: invalid source type"))?;
        let target = env
            .get_or_create(&query.target)
            .with_context(|| format!("query {index}: invalid target type"))?;
        let assignable = can_assign_to(&env, source, target);
        let reason = if assignable {
            None
        } else {
            explain_assignability(&env, source, target).map(|failure| failure.message(&formatter))
        };
        queries.push(QueryReport {
            source: formatter.format(source),
            target: formatter.format(target),
            assignable,
            expected: query.expected,
            reason,
        });
    }

    let status = if queries.iter().all(QueryReport::meets_expectation) {
        CheckStatus::Passed
    } else {
        CheckStatus::Failed
    };
    Ok(CheckReport { status, queries })
}
