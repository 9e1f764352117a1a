use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use yelp_explorer::config::Config;
use yelp_explorer::controller::{ListController, ListPhase, ListStatus};
use yelp_explorer::gateway_client::YelpGatewayClient;
use yelp_explorer::post_filter::{NoFilter, RecordFilter, TipFilter, UserFilter, VisibleOutcome};
use yelp_explorer::query::{
    BusinessQuery, CheckinQuery, ListQuery, ReviewQuery, TipQuery, UserQuery,
};
use yelp_explorer::render;

#[derive(Parser, Debug)]
#[command(author, version, about = "Explore the Yelp dataset through its REST backend")]
struct Cli {
    /// Number of pages to load (each page is YELP_PAGE_SIZE records)
    #[arg(short, long, global = true, default_value_t = 1)]
    pages: u32,

    /// How many times to retry a failed page before giving up
    #[arg(long, global = true, default_value_t = 1)]
    retry: u32,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "lower_case")]
enum Command {
    /// Check the backend: health endpoint plus a small sample of businesses and reviews
    Check,
    /// List businesses, optionally by city, state, name or minimum rating
    Businesses {
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        state: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        min_stars: Option<f64>,
    },
    /// List reviews, optionally for one business or one user
    Reviews {
        #[arg(long, conflicts_with = "user")]
        business: Option<String>,
        #[arg(long)]
        user: Option<String>,
    },
    /// List users, filtering loaded pages by review count and rating
    Users {
        #[arg(long)]
        min_reviews: Option<u32>,
        #[arg(long)]
        min_stars: Option<f64>,
    },
    /// List tips, filtering loaded pages by compliments and year
    Tips {
        #[arg(long, conflicts_with = "user")]
        business: Option<String>,
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        min_compliments: Option<u32>,
        #[arg(long)]
        year: Option<i32>,
    },
    /// List check-ins, optionally for one business
    Checkins {
        #[arg(long)]
        business: Option<String>,
    },
    /// Show a single record by id
    Get {
        #[arg(value_enum)]
        resource: Resource,
        id: String,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Resource {
    Business,
    Review,
    User,
}

/// Drives one list view: first page, then more pages while they exist,
/// retrying failed pages, and finally prints what the filter lets through.
async fn browse<Q, F>(
    gateway: &YelpGatewayClient,
    cli: &Cli,
    page_size: u32,
    query: Q,
    filter: &F,
    line: fn(&Q::Record) -> String,
) -> anyhow::Result<()>
where
    Q: ListQuery,
    F: RecordFilter<Q::Record>,
{
    let mut list = ListController::new(query, page_size);
    list.load_initial(gateway).await;

    let mut pages_loaded = 0;
    let mut retries_left = cli.retry;
    loop {
        match list.phase() {
            ListPhase::Failed if retries_left > 0 => {
                retries_left -= 1;
                tracing::warn!("Retrying failed page ({} retries left)", retries_left);
                list.retry_with(gateway).await;
            }
            ListPhase::Loaded => {
                pages_loaded += 1;
                if pages_loaded >= cli.pages || !list.has_more() {
                    break;
                }
                list.load_more(gateway).await;
            }
            _ => break,
        }
    }

    for record in list.visible(filter) {
        println!("{}", line(record));
    }

    match list.status() {
        ListStatus::NoResults => println!("No results for this filter."),
        ListStatus::Ready { count, has_more } => {
            if let VisibleOutcome::HiddenByFilter { hidden, more_available } =
                list.visible_outcome(filter)
            {
                println!(
                    "All {} loaded records were hidden by the filter{}.",
                    hidden,
                    if more_available {
                        "; more pages are available (use --pages)"
                    } else {
                        ""
                    }
                );
            }
            println!(
                "-- {} records loaded{}",
                count,
                if has_more { ", more available" } else { "" }
            );
        }
        ListStatus::Failed {
            kind,
            message,
            count,
        } => {
            eprintln!("{} ({} records loaded before the failure)", message, count);
            anyhow::bail!("request failed: {}", kind);
        }
        other => tracing::debug!("Finished in state {:?}", other),
    }

    Ok(())
}

/// Main entry point for the explorer.
///
/// Initializes logging, resolves configuration, builds the gateway and runs
/// the requested view.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so listings on stdout stay clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yelp_explorer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::from_env()?;
    let gateway = YelpGatewayClient::new(&config).context("Failed to initialize API client")?;
    tracing::info!("API client initialized: {}", gateway.base_url());

    let page_size = config.page_size;

    match &cli.command {
        Command::Check => match gateway.probe().await {
            Ok(report) => {
                println!("API health: {}", report.health);
                println!("Businesses sampled: {}", report.business_count);
                println!("Reviews sampled: {}", report.review_count);
                println!("API connection successful");
            }
            Err(e) => {
                eprintln!("API error: {}", e.user_message());
                anyhow::bail!("connectivity check failed: {}", e);
            }
        },
        Command::Businesses {
            city,
            state,
            name,
            min_stars,
        } => {
            let query = BusinessQuery::from_inputs(
                city.as_deref(),
                state.as_deref(),
                name.as_deref(),
                *min_stars,
            );
            browse(&gateway, &cli, page_size, query, &NoFilter, render::business_line).await?;
        }
        Command::Reviews { business, user } => {
            let query = match (business, user) {
                (Some(id), _) => ReviewQuery::Business(id.clone()),
                (None, Some(id)) => ReviewQuery::User(id.clone()),
                (None, None) => ReviewQuery::All,
            };
            browse(&gateway, &cli, page_size, query, &NoFilter, render::review_line).await?;
        }
        Command::Users {
            min_reviews,
            min_stars,
        } => {
            let filter = UserFilter {
                min_reviews: *min_reviews,
                min_average_stars: *min_stars,
            };
            browse(&gateway, &cli, page_size, UserQuery::All, &filter, render::user_line).await?;
        }
        Command::Tips {
            business,
            user,
            min_compliments,
            year,
        } => {
            let query = match (business, user) {
                (Some(id), _) => TipQuery::Business(id.clone()),
                (None, Some(id)) => TipQuery::User(id.clone()),
                (None, None) => TipQuery::All,
            };
            let filter = TipFilter {
                min_compliments: *min_compliments,
                year: *year,
            };
            browse(&gateway, &cli, page_size, query, &filter, render::tip_line).await?;
        }
        Command::Checkins { business } => {
            let query = business
                .clone()
                .map(CheckinQuery::Business)
                .unwrap_or_default();
            browse(&gateway, &cli, page_size, query, &NoFilter, render::checkin_line).await?;
        }
        Command::Get { resource, id } => {
            let line = match resource {
                Resource::Business => gateway
                    .get_business(id)
                    .await
                    .map(|b| render::business_line(&b)),
                Resource::Review => gateway.get_review(id).await.map(|r| render::review_line(&r)),
                Resource::User => gateway.get_user(id).await.map(|u| render::user_line(&u)),
            };
            match line {
                Ok(line) => println!("{}", line),
                Err(e) => {
                    eprintln!("{}", e.user_message());
                    anyhow::bail!("lookup failed: {}", e);
                }
            }
        }
    }

    Ok(())
}
