use std::process;
use std::str::FromStr;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use speechgather::filter::{DateRange, UnparsableDatePolicy};
use speechgather::query::{DebatesQuery, HansardQuery, MembersQuery, Order};
use speechgather::types::{CanonicalSpeech, Chamber};
use speechgather::{
    FullTextFetcher, RecordClient, SpeechGatherer, UNAVAILABLE_SPEECH, UNAVAILABLE_URL,
};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "speechgather")]
#[command(about = "Gather full OpenAustralia Hansard speeches", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[arg(
        long,
        env = "OPENAUSTRALIA_API_KEY",
        hide_env_values = true,
        global = true,
        help = "OpenAustralia API key"
    )]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, ValueEnum)]
enum UnparsableDates {
    Earliest,
    Include,
    Exclude,
}

impl From<UnparsableDates> for UnparsableDatePolicy {
    fn from(value: UnparsableDates) -> Self {
        match value {
            UnparsableDates::Earliest => UnparsableDatePolicy::TreatAsEarliest,
            UnparsableDates::Include => UnparsableDatePolicy::Include,
            UnparsableDates::Exclude => UnparsableDatePolicy::Exclude,
        }
    }
}

#[derive(Args)]
struct GatherArgs {
    #[arg(
        long,
        value_name = "YYYY-MM-DD",
        help = "Keep speeches from this date onwards",
        value_parser = parse_date,
    )]
    start_date: Option<NaiveDate>,

    #[arg(
        long,
        value_name = "YYYY-MM-DD",
        help = "Keep speeches up to this date",
        value_parser = parse_date,
    )]
    end_date: Option<NaiveDate>,

    #[arg(
        long,
        value_enum,
        default_value = "earliest",
        help = "How to treat records whose date cannot be parsed"
    )]
    unparsable_dates: UnparsableDates,

    #[arg(
        short = 'j',
        long,
        default_value_t = 1,
        value_parser = clap::value_parser!(u16).range(1..),
        help = "Number of detail pages fetched at once"
    )]
    concurrency: u16,

    #[arg(long, help = "Restrict speaker names and speech text to printable ASCII")]
    ascii: bool,

    #[arg(
        short = 'o',
        long = "output",
        value_enum,
        default_value = "text",
        help = "Output format"
    )]
    format: OutputFormat,
}

impl GatherArgs {
    fn date_range(&self) -> Result<Option<DateRange>, String> {
        if self.start_date.is_none() && self.end_date.is_none() {
            return Ok(None);
        }
        let range = DateRange::new(
            self.start_date.unwrap_or(NaiveDate::MIN),
            self.end_date.unwrap_or(NaiveDate::MAX),
        )
        .map_err(|e| e.to_string())?;
        Ok(Some(range.with_policy(self.unparsable_dates.clone().into())))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Search Hansard across both chambers and reconcile each speech
    Hansard {
        #[arg(long, help = "Only speeches by this person id")]
        person: Option<String>,

        #[arg(long, help = "Only speeches containing this term")]
        search: Option<String>,

        #[arg(long, value_parser = parse_order, help = "Order by date, relevance or person")]
        order: Option<Order>,

        #[arg(long, value_parser = clap::value_parser!(u32).range(1..), help = "Results page")]
        page: Option<u32>,

        #[arg(long, value_parser = clap::value_parser!(u32).range(1..), help = "Results per page")]
        num: Option<u32>,

        #[command(flatten)]
        gather: GatherArgs,
    },
    /// Fetch debates for one chamber and reconcile each speech
    Debates {
        #[arg(long, value_parser = parse_chamber, help = "Chamber: representatives or senate")]
        kind: Chamber,

        #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date, help = "Sitting date")]
        date: Option<NaiveDate>,

        #[arg(long, help = "Only debates containing this term")]
        search: Option<String>,

        #[arg(long, help = "Only debates by this person id")]
        person: Option<String>,

        #[arg(long, help = "A single debate by its gid")]
        gid: Option<String>,

        #[arg(long, help = "Only debates from this year")]
        year: Option<i32>,

        #[arg(long, value_parser = parse_order, help = "Order by date or relevance")]
        order: Option<Order>,

        #[arg(long, value_parser = clap::value_parser!(u32).range(1..), help = "Results page")]
        page: Option<u32>,

        #[arg(long, value_parser = clap::value_parser!(u32).range(1..), help = "Results per page")]
        num: Option<u32>,

        #[command(flatten)]
        gather: GatherArgs,
    },
    /// List sitting senators or representatives, e.g. to look up person ids
    Members {
        #[arg(long, value_parser = parse_chamber, help = "Chamber: representatives or senate")]
        chamber: Chamber,

        #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date, help = "Membership as of this date")]
        date: Option<NaiveDate>,

        #[arg(long, help = "Filter by party")]
        party: Option<String>,

        #[arg(long, help = "Filter senators by state (NSW, TAS, WA, ...)")]
        state: Option<String>,

        #[arg(long, help = "Filter representatives by postcode")]
        postcode: Option<String>,

        #[arg(long, help = "Filter by name")]
        search: Option<String>,

        #[arg(long, value_parser = clap::value_parser!(u32).range(1..), help = "Results page")]
        page: Option<u32>,

        #[arg(long, value_parser = clap::value_parser!(u32).range(1..), help = "Results per page")]
        num: Option<u32>,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| e.to_string())
}

fn parse_chamber(s: &str) -> Result<Chamber, String> {
    Chamber::from_str(s).map_err(|e| e.to_string())
}

fn parse_order(s: &str) -> Result<Order, String> {
    Order::from_str(s).map_err(|e| e.to_string())
}

fn serialize_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Error serializing to JSON: {}", e);
            process::exit(1);
        }
    }
}

struct SpeechStats {
    total: usize,
    unavailable: usize,
    without_url: usize,
}

impl SpeechStats {
    fn from_speeches(speeches: &[CanonicalSpeech]) -> SpeechStats {
        SpeechStats {
            total: speeches.len(),
            unavailable: speeches
                .iter()
                .filter(|s| s.full_text == UNAVAILABLE_SPEECH)
                .count(),
            without_url: speeches
                .iter()
                .filter(|s| s.source_url == UNAVAILABLE_URL)
                .count(),
        }
    }
}

impl std::fmt::Display for SpeechStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nStatistics:")?;
        writeln!(f, "  Speeches:                   {}", self.total)?;
        writeln!(f, "  Full text unavailable:      {}", self.unavailable)?;
        writeln!(f, "  Without a source URL:       {}", self.without_url)
    }
}

fn print_speeches(speeches: Vec<CanonicalSpeech>, gather: &GatherArgs) {
    let speeches: Vec<CanonicalSpeech> = if gather.ascii {
        speeches.iter().map(CanonicalSpeech::to_ascii).collect()
    } else {
        speeches
    };

    match gather.format {
        OutputFormat::Json => serialize_json(&speeches),
        OutputFormat::Text => {
            if speeches.is_empty() {
                println!("No speeches to display.");
            } else {
                for (i, speech) in speeches.iter().enumerate() {
                    println!("{:>3}. {}", i + 1, speech);
                }
                print!("{}", SpeechStats::from_speeches(&speeches));
            }
        }
    }
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, keeping the speeches gathered so far");
            trigger.cancel();
        }
    });
    cancel
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .target(env_logger::Target::Stderr)
        .init();

    let client = RecordClient::new(cli.api_key.unwrap_or_default()).unwrap_or_else(|e| {
        log::error!("{e}. Pass --api-key or set OPENAUSTRALIA_API_KEY");
        process::exit(1);
    });

    let build_gatherer = |client: RecordClient, concurrency: u16| {
        let fetcher = FullTextFetcher::new().unwrap_or_else(|e| {
            log::error!("Error creating fetcher: {}", e);
            process::exit(1);
        });
        SpeechGatherer::new(client, fetcher).with_concurrency(concurrency.into())
    };

    match cli.command {
        Commands::Hansard {
            person,
            search,
            order,
            page,
            num,
            gather,
        } => {
            let range = gather.date_range().unwrap_or_else(|e| {
                log::error!("Invalid args: {e}");
                process::exit(1);
            });
            let query = HansardQuery {
                search,
                person,
                order,
                page,
                num,
            };
            let gatherer = build_gatherer(client, gather.concurrency);
            let cancel = cancel_on_ctrl_c();

            let speeches = gatherer
                .gather_hansard(&query, range.as_ref(), &cancel)
                .await
                .unwrap_or_else(|e| {
                    log::error!("Error fetching hansard: {}", e);
                    process::exit(1);
                });

            print_speeches(speeches, &gather);
        }

        Commands::Debates {
            kind,
            date,
            search,
            person,
            gid,
            year,
            order,
            page,
            num,
            gather,
        } => {
            let range = gather.date_range().unwrap_or_else(|e| {
                log::error!("Invalid args: {e}");
                process::exit(1);
            });
            let query = DebatesQuery {
                kind: Some(kind),
                date,
                search,
                person_id: person,
                gid,
                year,
                order,
                page,
                num,
            };
            let gatherer = build_gatherer(client, gather.concurrency);
            let cancel = cancel_on_ctrl_c();

            let speeches = gatherer
                .gather_debates(&query, range.as_ref(), &cancel)
                .await
                .unwrap_or_else(|e| {
                    log::error!("Error fetching {} debates: {}", kind, e);
                    process::exit(1);
                });

            print_speeches(speeches, &gather);
        }

        Commands::Members {
            chamber,
            date,
            party,
            state,
            postcode,
            search,
            page,
            num,
            format,
        } => {
            let query = MembersQuery {
                chamber,
                date,
                party,
                state,
                postcode,
                search,
                page,
                num,
            };

            let members = client.fetch_members(&query).await.unwrap_or_else(|e| {
                log::error!("Error fetching members: {}", e);
                process::exit(1);
            });

            match format {
                OutputFormat::Json => serialize_json(&members),
                OutputFormat::Text => {
                    if members.is_empty() {
                        println!("No members to display.");
                    } else {
                        for (i, member) in members.iter().enumerate() {
                            println!("{:>3}. {}", i + 1, member);
                        }
                        println!("\n{} {} member(s)", members.len(), chamber);
                    }
                }
            }
        }
    }
}
