use std::path;
use std::process;
use std::time::Duration;

use bytesize::ByteSize;
use clap::ArgEnum;
use env_logger;
use log;

use ext_int_sort::progress;
use ext_int_sort::{Codec, ExternalSorter, ExternalSorterBuilder};

const PROGRESS_POLL_TIMEOUT: Duration = Duration::from_millis(100);

fn main() {
    let arg_parser = build_arg_parser();

    let log_level: LogLevel = arg_parser.value_of_t_or_exit("log_level");
    init_logger(log_level);

    let codec: CodecArg = arg_parser.value_of_t_or_exit("codec");
    let tmp_dir: Option<&str> = arg_parser.value_of("tmp_dir");
    let memory = arg_parser.value_of("memory").expect("value is required");
    let threads: Option<usize> = arg_parser
        .is_present("threads")
        .then(|| arg_parser.value_of_t_or_exit("threads"));

    let input = path::PathBuf::from(arg_parser.value_of("input").expect("value is required"));
    let output = match arg_parser.value_of("output") {
        Some(output) => path::PathBuf::from(output),
        None => {
            let mut output = input.clone().into_os_string();
            output.push(".sorted");
            path::PathBuf::from(output)
        }
    };

    let run_capacity = parse_run_capacity(memory).expect("value is pre-validated");
    let mut sorter_builder = ExternalSorterBuilder::new()
        .with_codec(codec.into())
        .with_run_capacity(run_capacity);

    if let Some(threads) = threads {
        sorter_builder = sorter_builder.with_threads_number(threads);
    }

    if let Some(tmp_dir) = tmp_dir {
        sorter_builder = sorter_builder.with_tmp_dir(path::Path::new(tmp_dir));
    }

    let printer = if arg_parser.is_present("progress") {
        let (sender, receiver) = progress::channel(progress::DEFAULT_CAPACITY);
        sorter_builder = sorter_builder.with_progress(sender.clone());
        let handle = progress::spawn_printer(receiver, PROGRESS_POLL_TIMEOUT, |msg| eprintln!("{}", msg));
        Some((sender, handle))
    } else {
        None
    };

    let sorter: ExternalSorter = match sorter_builder.build() {
        Ok(sorter) => sorter,
        Err(err) => {
            log::error!("sorter initialization error: {}", err);
            process::exit(1);
        }
    };

    log::info!("source file: {}", input.display());
    log::info!("destination file: {}", output.display());

    let result = if arg_parser.is_present("in_memory") {
        sorter.sort_in_memory(&input, &output)
    } else {
        sorter.sort(&input, &output)
    };

    if let Some((sender, handle)) = printer {
        sender.finish();
        if handle.join().is_err() {
            log::error!("progress printer panicked");
        }
    }

    match result {
        Ok(stats) => println!("Sorted in {} ({})", ext_int_sort::sort::format_elapsed(stats.elapsed()), stats),
        Err(err) => {
            log::error!("data sorting error: {}", err);
            process::exit(1);
        }
    }
}

#[derive(Copy, Clone, clap::ArgEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn possible_values() -> impl Iterator<Item = clap::PossibleValue<'static>> {
        Self::value_variants().iter().filter_map(|v| v.to_possible_value())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <LogLevel as clap::ArgEnum>::from_str(s, false)
    }
}

#[derive(Copy, Clone, clap::ArgEnum)]
enum CodecArg {
    Binary,
    Text,
}

impl CodecArg {
    pub fn possible_values() -> impl Iterator<Item = clap::PossibleValue<'static>> {
        CodecArg::value_variants().iter().filter_map(|v| v.to_possible_value())
    }
}

impl std::str::FromStr for CodecArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <CodecArg as clap::ArgEnum>::from_str(s, false)
    }
}

impl From<CodecArg> for Codec {
    fn from(arg: CodecArg) -> Self {
        match arg {
            CodecArg::Binary => Codec::Binary,
            CodecArg::Text => Codec::Text,
        }
    }
}

fn build_arg_parser() -> clap::ArgMatches {
    clap::App::new("ext-int-sort")
        .about("external sorter for integer files")
        .arg(
            clap::Arg::new("input")
                .short('i')
                .long("input")
                .help("file to be sorted")
                .required(true)
                .takes_value(true),
        )
        .arg(
            clap::Arg::new("output")
                .short('o')
                .long("output")
                .help("result file (default: <input>.sorted)")
                .takes_value(true),
        )
        .arg(
            clap::Arg::new("codec")
                .short('c')
                .long("codec")
                .help("data encoding")
                .takes_value(true)
                .default_value("text")
                .possible_values(CodecArg::possible_values()),
        )
        .arg(
            clap::Arg::new("memory")
                .short('m')
                .long("memory")
                .help("number of values held in memory per run, decimal suffixes allowed (10k, 5mb)")
                .required(true)
                .takes_value(true)
                .validator(|v| parse_run_capacity(v).map(|_| ())),
        )
        .arg(
            clap::Arg::new("in_memory")
                .long("in-memory")
                .help("sort the whole file in memory"),
        )
        .arg(
            clap::Arg::new("progress")
                .short('p')
                .long("progress")
                .help("print progress messages to stderr"),
        )
        .arg(
            clap::Arg::new("log_level")
                .short('l')
                .long("loglevel")
                .help("logging level")
                .takes_value(true)
                .default_value("info")
                .possible_values(LogLevel::possible_values()),
        )
        .arg(
            clap::Arg::new("threads")
                .short('t')
                .long("threads")
                .help("number of threads to use for in-memory sorting")
                .takes_value(true),
        )
        .arg(
            clap::Arg::new("tmp_dir")
                .short('d')
                .long("tmp-dir")
                .help("directory to be used to store temporary data")
                .takes_value(true),
        )
        .get_matches()
}

fn parse_run_capacity(value: &str) -> Result<usize, String> {
    let size = value
        .parse::<ByteSize>()
        .map_err(|err| format!("Memory format incorrect: {}", err))?;

    return match usize::try_from(size.as_u64()) {
        Ok(0) => Err("Memory must be at least one value".to_string()),
        Ok(capacity) => Ok(capacity),
        Err(_) => Err(format!("Memory {} exceeds the addressable range", size.as_u64())),
    };
}

fn init_logger(log_level: LogLevel) {
    env_logger::Builder::new()
        .filter_level(match log_level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        })
        .format_timestamp_millis()
        .init();
}

#[cfg(test)]
mod test {
    use rstest::*;

    use super::parse_run_capacity;

    #[rstest]
    #[case("1", Some(1))]
    #[case("10k", Some(10_000))]
    #[case("5mb", Some(5_000_000))]
    #[case("0", None)]
    #[case("lots", None)]
    fn test_parse_run_capacity(#[case] value: &str, #[case] expected: Option<usize>) {
        assert_eq!(parse_run_capacity(value).ok(), expected);
    }

    #[cfg(target_pointer_width = "32")]
    #[test]
    fn test_run_capacity_beyond_address_space() {
        assert!(parse_run_capacity("5gb").is_err());
    }
}
