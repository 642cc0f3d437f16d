use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::error;

use myfs::consts::STORE_SIZE;
use myfs::{script, FileDrive, FileSystem};

#[derive(Parser, Debug)]
struct Args {
    /// Image file holding the filesystem, created and formatted if missing
    #[arg(short, long, default_value = "./myfs")]
    image: PathBuf,

    /// Report block ownership problems once the script has run
    #[arg(long)]
    check: bool,

    /// Acknowledge every successful command on stdout
    #[arg(long)]
    confirm: bool,

    /// Command script, one instruction per line
    script: PathBuf,
}

fn run(args: &Args) -> Result<bool, Box<dyn std::error::Error>> {
    let script_file = File::open(&args.script)?;
    let mut fs = FileSystem::open(FileDrive::new(&args.image, STORE_SIZE)?)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let summary = script::run(&mut fs, BufReader::new(script_file), &mut out, args.confirm)?;
    log::info!("{} commands, {} failed", summary.executed, summary.failed);

    if !args.check {
        return Ok(true);
    }
    let problems = fs.check()?;
    for problem in &problems {
        println!("Problem: {}", problem);
    }
    Ok(problems.is_empty())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{}", err);
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
