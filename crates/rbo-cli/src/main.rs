use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "rbo")]
#[command(about = "Order lifecycle guard and transition journal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the statuses of a kind (SALE | QUOTATION | FULFILLMENT)
    Statuses { kind: String },

    /// Print the statuses reachable from FROM in one step, one per line
    Allowed { kind: String, from: String },

    /// Print allowed=true|false for FROM -> TO
    Check {
        kind: String,
        from: String,
        to: String,
    },

    /// Exit non-zero with the guard's message when FROM -> TO is refused
    Ensure {
        kind: String,
        from: String,
        to: String,
    },

    /// Print every edge of a kind's transition table
    Graph { kind: String },

    /// Print the workflow events that carry a fulfillment status change
    FulfilmentPlan {
        from: String,
        to: String,

        /// Stored workflow state (defaults to the one implied by FROM)
        #[arg(long = "workflow-state")]
        workflow_state: Option<String>,
    },

    /// Apply one sale workflow event and print the resulting state + context
    SaleStep {
        /// Coarse sale status (used when --workflow-state is absent)
        #[arg(long)]
        status: String,

        /// Event JSON, e.g. '{"type":"PAYMENT_CAPTURED","amount":2500}'
        #[arg(long)]
        event: String,

        /// Stored workflow state
        #[arg(long = "workflow-state")]
        workflow_state: Option<String>,

        /// Stored context JSON
        #[arg(long)]
        context: Option<String>,
    },

    /// Transition journal utilities
    Journal {
        #[command(subcommand)]
        cmd: JournalCmd,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> env -> site...)
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[derive(Subcommand)]
enum JournalCmd {
    /// Guard FROM -> TO, then append it to the configured journal.
    Record {
        #[arg(long)]
        kind: String,

        #[arg(long = "entity-id")]
        entity_id: String,

        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,

        /// Event name (e.g. order.fulfillment.status_changed)
        #[arg(long)]
        event: Option<String>,

        /// Metadata JSON object
        #[arg(long)]
        metadata: Option<String>,

        /// Layered config paths in merge order
        #[arg(long = "config")]
        config_paths: Vec<String>,

        /// Journal path; overrides journal.path from config
        #[arg(long)]
        journal: Option<String>,
    },

    /// Verify sequence and hash chain of a journal file.
    Verify { path: String },
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let cli = Cli::parse();

    // `journal record` sets up logging once its config is loaded.
    let config_driven = matches!(
        cli.cmd,
        Commands::Journal {
            cmd: JournalCmd::Record { .. }
        }
    );
    if !config_driven {
        commands::init_tracing(None);
    }

    match cli.cmd {
        Commands::Statuses { kind } => commands::lifecycle::statuses(&kind),
        Commands::Allowed { kind, from } => commands::lifecycle::allowed(&kind, &from),
        Commands::Check { kind, from, to } => commands::lifecycle::check(&kind, &from, &to),
        Commands::Ensure { kind, from, to } => commands::lifecycle::ensure(&kind, &from, &to),
        Commands::Graph { kind } => commands::lifecycle::graph(&kind),

        Commands::FulfilmentPlan {
            from,
            to,
            workflow_state,
        } => commands::workflow::fulfilment_plan(&from, &to, workflow_state.as_deref()),

        Commands::SaleStep {
            status,
            event,
            workflow_state,
            context,
        } => commands::workflow::sale_step(
            &status,
            &event,
            workflow_state.as_deref(),
            context.as_deref(),
        ),

        Commands::Journal { cmd } => match cmd {
            JournalCmd::Record {
                kind,
                entity_id,
                from,
                to,
                event,
                metadata,
                config_paths,
                journal,
            } => commands::journal::record(commands::journal::RecordArgs {
                kind,
                entity_id,
                from,
                to,
                event,
                metadata,
                config_paths,
                journal,
            }),
            JournalCmd::Verify { path } => commands::journal::verify(&path),
        },

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = rbo_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
            Ok(())
        }
    }
}
