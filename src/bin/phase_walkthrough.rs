//! Walks every migration phase against the configured stores and prints what each phase would do.

use migration_dual_read::domain::result::{DataSourceResult, DualReadResult};
use migration_dual_read::infra::logging::init_tracing;
use migration_dual_read::{migration_health, DualReadService, MigrationConfig, Phase, Settings, StoreClients};

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin phase_walkthrough -- [--user-id <id>]\n\
         \n\
         Reads env vars:\n\
           SUPABASE_URL + SUPABASE_SERVICE_ROLE_KEY (or SUPABASE_DB_URL)\n\
           DYNAMODB_TABLE_NAME, AWS_REGION (credentials from the AWS default chain)\n"
    );
    std::process::exit(2);
}

fn mark(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "--"
    }
}

fn describe(label: &str, result: &DataSourceResult) {
    match &result.error {
        Some(e) => println!("    {} ({}): error: {} ({}ms)", label, result.source, e, result.response_time),
        None => println!(
            "    {} ({}): data {} ({}ms)",
            label,
            result.source,
            mark(result.present_data().is_some()),
            result.response_time
        ),
    }
}

fn report(title: &str, result: &DualReadResult) {
    println!("  {}:", title);
    describe("Primary", &result.primary);
    if let Some(fallback) = &result.fallback {
        describe("Fallback", fallback);
    }
    if let Some(cmp) = &result.comparison {
        println!("    Data match: {}", mark(cmp.matches));
        if !cmp.matches {
            println!("    Differences: {}", cmp.differences.join(", "));
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }
    let user_id = match args.iter().position(|a| a == "--user-id") {
        Some(i) => args.get(i + 1).cloned().unwrap_or_else(|| usage_and_exit()),
        None => "user-123".to_string(),
    };

    let config = MigrationConfig::new(Settings::from_env());
    let clients = StoreClients::from_config(&config.dual_read_policy()).await?;

    println!("> Phase walkthrough (user {})", user_id);
    for phase in Phase::ALL {
        config.set_phase(phase);
        println!("\n> Phase: {}", phase);
        println!("{}", "=".repeat(40));

        let health = migration_health(&config, clients.clone()).await;
        println!("  Health:");
        println!(
            "    Supabase: {} ({}ms)",
            mark(health.data_sources.supabase.available),
            health.data_sources.supabase.response_time
        );
        println!(
            "    DynamoDB: {} ({}ms)",
            mark(health.data_sources.dynamodb.available),
            health.data_sources.dynamodb.response_time
        );
        for rec in &health.recommendations {
            println!("    - {}", rec);
        }

        let service = DualReadService::with_clients(config.dual_read_policy(), clients.clone());
        report("User read", &service.get_user(&user_id).await);
        report("Accounts read", &service.get_user_accounts(&user_id).await);

        let status = config.migration_status();
        println!("  Status:");
        println!("    Primary source: {}", status.primary_source);
        println!("    Fallback enabled: {}", mark(status.fallback_enabled));
        println!("    Comparison mode: {}", mark(status.comparison_mode));
    }

    println!("\n> Phase walkthrough complete.");
    Ok(())
}
