use log::info;
use std::{
    env, fs,
    io::{self, Read, Write},
    path::{Path, PathBuf},
};

use structopt::StructOpt;
use thiserror::Error;
use url::Url;

use wsdl2rs_codegen::{self as codegen, FormatterKind, Options};
use wsdl2rs_wsdl::{self as wsdl, types::Definitions, FetchOptions, HttpFetcher};

#[derive(Debug, Error)]
enum Error {
    #[error("Error reading service description")]
    ParseError(#[from] wsdl::error::Error),

    #[error("Error generating code")]
    CodegenError(#[from] codegen::Error),

    #[error("Working directory {0:?} can't be used as a base URL")]
    WorkingDirectory(PathBuf),

    #[error("Error")]
    IoError(#[from] std::io::Error),
}

#[derive(Debug, StructOpt)]
#[structopt(name = "wsdl2rs", about = "Generates Rust SOAP clients from WSDL")]
struct Args {
    /// Input file, URL, or '-' for stdin
    #[structopt(short, long, default_value = "-")]
    input: String,

    /// Output file, directory, or '-' for stdout
    #[structopt(short, long, default_value = "-")]
    output: String,

    /// Prefix for operation elements in requests
    #[structopt(short, long)]
    namespace: Option<String>,

    /// Module name
    #[structopt(short, long)]
    package: Option<String>,

    /// Service trait name
    #[structopt(long)]
    client_type: Option<String>,

    /// Accept invalid https certificates
    #[structopt(long)]
    yolo: bool,

    /// Client TLS certificate file
    #[structopt(long, parse(from_os_str))]
    cert: Option<PathBuf>,

    /// Client TLS key file
    #[structopt(long, parse(from_os_str))]
    key: Option<PathBuf>,

    /// Keep optional simple fields as plain values
    #[structopt(long)]
    no_simple_type_indirect: bool,

    /// Version attribute sent with every request
    #[structopt(long)]
    request_version: Option<String>,

    /// Format with this rustfmt binary instead of prettyplease
    #[structopt(long)]
    rustfmt: Option<String>,

    /// Log every fetched document
    #[structopt(short, long)]
    verbose: bool,
}

impl Args {
    fn options(&self) -> Options {
        let mut options = Options::new();

        options.package = self.package.clone();
        options.namespace = self.namespace.clone();
        options.client_type = self.client_type.clone();
        options.no_simple_type_indirect = self.no_simple_type_indirect;
        options.request_version = self.request_version.clone();

        if let Some(program) = &self.rustfmt {
            options = options.formatter(FormatterKind::Rustfmt {
                program: program.clone(),
            });
        }

        options
    }

    fn reads_stdin(&self) -> bool {
        self.input.is_empty() || self.input == "-"
    }

    fn fetcher(&self) -> Result<HttpFetcher, Error> {
        let fetcher = HttpFetcher::new(&FetchOptions {
            insecure: self.yolo,
            client_cert: self.cert.clone(),
            client_key: self.key.clone(),
        })?;

        Ok(match Url::parse(&self.input) {
            Ok(url) => fetcher.with_credentials_from(&url),
            Err(_) => fetcher,
        })
    }
}

fn load(args: &Args, fetcher: &HttpFetcher) -> Result<(Definitions, Url), Error> {
    if !args.reads_stdin() {
        return Ok(wsdl::parse(&args.input, fetcher)?);
    }

    let mut bytes = Vec::new();
    io::stdin().read_to_end(&mut bytes)?;

    let directory = env::current_dir()?;
    let base = Url::from_directory_path(&directory)
        .map_err(|()| Error::WorkingDirectory(directory.clone()))?;

    Ok((wsdl::parse_bytes(&bytes, "stdin")?, base))
}

fn write(path: &Path, code: &str) -> Result<(), Error> {
    fs::write(path, code)?;
    info!("Wrote {}", path.display());
    Ok(())
}

#[paw::main]
fn main(args: Args) -> Result<(), Error> {
    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let fetcher = args.fetcher()?;
    let (definitions, base) = load(&args, &fetcher)?;
    let options = args.options();

    match args.output.as_str() {
        "" | "-" => {
            let code = codegen::generate(definitions, &base, &fetcher, &options)?;
            io::stdout().write_all(code.as_bytes())?;
        }

        output if Path::new(output).is_dir() => {
            let directory = Path::new(output);

            let types = options.clone().only_types();
            let code = codegen::generate(definitions.clone(), &base, &fetcher, &types)?;
            write(&directory.join("types.rs"), &code)?;

            let interface = options.only_interface();
            let code = codegen::generate(definitions, &base, &fetcher, &interface)?;
            write(&directory.join("interface.rs"), &code)?;
        }

        output => {
            let code = codegen::generate(definitions, &base, &fetcher, &options)?;
            write(Path::new(output), &code)?;
        }
    }

    Ok(())
}
