//! Example fetching a staged manifest and reading a property from it
//!
//! Needs OPSMAN_URL, OPSMAN_USERNAME and OPSMAN_PASSWORD in the environment
//! or in a `.env` file. Run this example with:
//! ```
//! cargo run --example fetch_staged_manifest -- p-mysql mysql cf_mysql.mysql.port
//! ```

use om_manifest::OpsManagerAPI;

#[tokio::main]
async fn main() -> om_manifest::fetcher::Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let product = args.next().unwrap_or_else(|| "p-mysql".to_string());
    let job = args.next().unwrap_or_else(|| "mysql".to_string());
    let lens = args.next();

    let api = OpsManagerAPI::from_env()?;
    println!("Fetching staged manifest for {} from {}", product, api.config().url);

    let manifest = api.get_staged_product_manifest(&product).await?;
    println!("Instance groups:");
    for group in manifest.instance_groups() {
        println!("  {} ({} instances)", group.name(), group.instances());
    }

    let resolved = manifest.job_named(&job)?;
    println!("'{}' resolved to '{}'", job, resolved.name());

    match lens {
        Some(lens) => match resolved.properties().find(&lens) {
            Ok(value) => println!("{} = {}", lens, value),
            Err(e) if !e.is_fatal() => println!("{} is not set ({})", lens, e),
            Err(e) => return Err(e.into()),
        },
        None => {
            for key in resolved.properties().keys() {
                println!("  {}", key);
            }
        }
    }

    Ok(())
}
