use clap::Subcommand;
use hiit_core::timer::format_clock;
use hiit_core::{PlanStore, WorkoutPlan};

#[derive(Subcommand)]
pub enum PlanAction {
    /// List saved plans
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one plan
    Show {
        /// Plan name (case-insensitive)
        name: String,
    },
    /// Create or replace a plan
    Add {
        /// Plan name
        name: String,
        /// Work interval in seconds (5-300)
        #[arg(long, default_value = "45")]
        work: u32,
        /// Rest interval in seconds (5-300)
        #[arg(long, default_value = "15")]
        rest: u32,
        /// Exercise for the next round; repeat in order
        #[arg(long = "exercise", short = 'e')]
        exercises: Vec<String>,
    },
    /// Delete a plan
    Remove {
        /// Plan name (case-insensitive)
        name: String,
    },
}

fn describe(plan: &WorkoutPlan) -> String {
    format!(
        "{}  {} rounds  work {}s / rest {}s",
        plan.name(),
        plan.rounds(),
        plan.work_secs(),
        plan.rest_secs()
    )
}

pub fn run(action: PlanAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = PlanStore::open()?;

    match action {
        PlanAction::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(store.list())?);
            } else if store.list().is_empty() {
                println!("no saved plans in {}", store.path().display());
            } else {
                for plan in store.list() {
                    println!("{}", describe(plan));
                }
            }
        }
        PlanAction::Show { name } => {
            let plan = store.require(&name)?;
            let settings = hiit_core::Config::load_or_default();
            let total = settings.session(Some(plan.clone())).total_duration_secs();
            println!("{}", describe(plan));
            for (i, exercise) in plan.exercises().iter().enumerate() {
                println!("  {:>2}. {exercise}", i + 1);
            }
            println!("total: {}", format_clock(total * 1000));
        }
        PlanAction::Add {
            name,
            work,
            rest,
            exercises,
        } => {
            let plan = WorkoutPlan::new(name.trim(), work, rest, exercises);
            let summary = describe(&plan);
            let replaced = store.upsert(plan)?;
            store.save()?;
            let verb = if replaced { "updated" } else { "saved" };
            println!("{verb}: {summary}");
        }
        PlanAction::Remove { name } => {
            let removed = store.remove(&name)?;
            store.save()?;
            println!("removed: {}", removed.name());
        }
    }
    Ok(())
}
