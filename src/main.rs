use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use stepwise_config::{RunnerDef, SchemeDef};
use stepwise_engine::{BuildPlan, Driver, Preview, StepOutcome, export_makefile, report};
use stepwise_graph::{TargetGraph, TargetId};
use stepwise_state::{FsStateStore, StateStore};

/// Stepwise - a dependency-driven, resumable build orchestrator
#[derive(Parser)]
#[command(name = "stepwise")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the scheme file (JSON)
  #[arg(long, env = "STEPWISE_SCHEME")]
  scheme: PathBuf,

  /// State directory, overriding the scheme's (default: current directory)
  #[arg(long, env = "STEPWISE_STATE_DIR")]
  state_dir: Option<PathBuf>,

  /// Runner to build targets with, overriding the scheme's
  #[arg(long, value_enum)]
  runner: Option<RunnerKind>,

  /// Log filter used when RUST_LOG is not set
  #[arg(long, default_value = "warn")]
  log_level: String,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum RunnerKind {
  Log,
  Command,
}

#[derive(Subcommand)]
enum Commands {
  /// Build a target now, whatever the state of its dependencies
  Compute { target: Option<String> },
  /// Show what `compute` would run
  Viewcompute { target: Option<String> },
  /// Build the next buildable target on the way to a goal
  Stepto { target: Option<String> },
  /// Show what `stepto` would build
  Viewstepto { target: Option<String> },
  /// Print the dependency tree of a target
  Dependency { target: Option<String> },
  /// Print the dependency tree of a target with build status
  Dependencystat { target: Option<String> },
  /// Print the artifact path of a target
  Targetfile { target: Option<String> },
  /// List declared targets
  List,
  /// Print the status of every target
  Stat,
  /// List artifact paths of every target
  Listfiles,
  /// Print a Makefile building every target through `<command> compute`
  Makefile {
    /// Command prefix invoking stepwise with this scheme
    command: String,
  },
  /// Step toward a goal until it is built or blocked
  Run { target: Option<String> },
}

fn main() -> Result<ExitCode> {
  let cli = Cli::parse();
  init_tracing(&cli.log_level);

  let scheme = SchemeDef::load(&cli.scheme)
    .with_context(|| format!("failed to load scheme: {}", cli.scheme.display()))?;
  let graph = scheme.to_graph().context("failed to build target graph")?;

  let state_dir = cli
    .state_dir
    .clone()
    .or_else(|| scheme.state_dir.clone())
    .unwrap_or_else(|| PathBuf::from("."));
  let store = FsStateStore::new(state_dir);

  let runner = match (cli.runner, scheme.runner()) {
    (Some(RunnerKind::Log), _) => RunnerDef::Log,
    (Some(RunnerKind::Command), def @ RunnerDef::Command { .. }) => def,
    (Some(RunnerKind::Command), RunnerDef::Log) => RunnerDef::Command { working_dir: None },
    (None, def) => def,
  };
  let driver = Driver::new(&graph, &store, runner.build());

  let goal = |target: Option<String>| resolve_goal(&graph, target);

  let ok = match cli.command {
    Commands::Compute { target } => {
      let target = goal(target)?;
      ensure_state_dir(&store)?;
      let outcome = driver.compute(&target)?;
      print_outcome(outcome)
    }
    Commands::Viewcompute { target } => {
      let target = goal(target)?;
      print_preview(driver.view_compute(&target))
    }
    Commands::Stepto { target } => {
      let target = goal(target)?;
      ensure_state_dir(&store)?;
      let report = driver.step_to(&target)?;
      if let Some(built) = &report.built {
        println!("Target: {}", built);
      }
      print_outcome(report.outcome)
    }
    Commands::Viewstepto { target } => {
      let target = goal(target)?;
      print_preview(driver.view_step_to(&target)?)
    }
    Commands::Dependency { target } => {
      let target = goal(target)?;
      print!("{}", report::dependency_tree(&graph, &store, &target));
      true
    }
    Commands::Dependencystat { target } => {
      let target = goal(target)?;
      print!("{}", report::dependency_status_tree(&graph, &store, &target));
      true
    }
    Commands::Targetfile { target } => {
      let target = goal(target)?;
      let path = report::target_file(&graph, &store, &target)?;
      println!("{}", path.display());
      true
    }
    Commands::List => {
      for target in graph.targets() {
        println!("{}", target);
      }
      true
    }
    Commands::Stat => {
      print!("{}", report::stat(&graph, &store));
      true
    }
    Commands::Listfiles => {
      for target in graph.targets() {
        println!("{}", store.artifact_path(target).display());
      }
      true
    }
    Commands::Makefile { command } => {
      print!(
        "{}",
        export_makefile(&graph, &store, &format!("{} compute", command))
      );
      true
    }
    Commands::Run { target } => {
      let target = goal(target)?;
      ensure_state_dir(&store)?;
      let summary = driver.run_to(&target)?;
      println!("Steps: {}", summary.steps);
      print_outcome(summary.outcome)
    }
  };

  Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn init_tracing(level: &str) {
  let filter = EnvFilter::try_from_default_env()
    .or_else(|_| EnvFilter::try_new(level))
    .unwrap_or_else(|_| EnvFilter::new("warn"));

  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(false)
    .with_writer(std::io::stderr)
    .try_init();
}

/// The named target, or the scheme's main target when none is given.
fn resolve_goal(graph: &TargetGraph, target: Option<String>) -> Result<TargetId> {
  match (target, graph.main_target()) {
    (Some(target), _) => Ok(TargetId::from(target)),
    (None, Some(main)) => Ok(main.clone()),
    (None, None) => bail!("no target given and the scheme has no main_target"),
  }
}

fn ensure_state_dir(store: &FsStateStore) -> Result<()> {
  store.ensure_dir().with_context(|| {
    format!(
      "failed to create state directory: {}",
      store.state_dir().display()
    )
  })
}

fn print_outcome(outcome: StepOutcome) -> bool {
  println!("Result: {}", outcome);
  outcome.is_success()
}

fn print_plan(plan: &BuildPlan) {
  println!("Target: {}", plan.target);
  println!("Build spec: {}", plan.description);
  if plan.locked {
    println!("WARNING: Target is locked!");
  }
}

fn print_preview(preview: Preview) -> bool {
  match preview {
    Preview::Next(plan) => {
      print_plan(&plan);
      true
    }
    Preview::NotFound => print_outcome(StepOutcome::TargetNotFound),
    Preview::Ready => print_outcome(StepOutcome::TargetReady),
    Preview::Locked => print_outcome(StepOutcome::TargetLocked),
    Preview::NoStepsAvailable => print_outcome(StepOutcome::NoStepsAvailable),
  }
}
