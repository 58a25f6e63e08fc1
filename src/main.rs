use std::io::{self, BufRead, Write};
use std::process;

use clap::{value_t, App, Arg};
use lepton::{Command, Credentials, FileSystem, ImageDisk};

fn main() {
    lepton::logging::init();

    let matches = App::new("lepton")
        .about("Interactive shell over a lepton disk image")
        .arg(
            Arg::with_name("disk")
                .help("Disk image to mount, created on first use")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("owner")
                .long("owner")
                .takes_value(true)
                .default_value("1")
                .help("Owner tag for created files and directories"),
        )
        .arg(
            Arg::with_name("group")
                .long("group")
                .takes_value(true)
                .default_value("2")
                .help("Group tag for created files and directories"),
        )
        .get_matches();

    let disk_name = matches.value_of("disk").unwrap_or_default();
    let owner = value_t!(matches, "owner", u32).unwrap_or_else(|e| e.exit());
    let group = value_t!(matches, "group", u32).unwrap_or_else(|e| e.exit());

    if let Err(e) = run(disk_name, Credentials::new(owner, group)) {
        eprintln!("lepton: {}", e);
        process::exit(1);
    }
}

fn run(disk_name: &str, credentials: Credentials) -> lepton::Result<()> {
    let mut fs = FileSystem::mount_as(ImageDisk::new(), disk_name, credentials)?;
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    print!("% ");
    stdout.flush()?;
    for line in stdin.lock().lines() {
        match Command::parse(&line?) {
            Ok(Some(Command::Quit)) => break,
            Ok(Some(cmd)) => match cmd.execute(&mut fs) {
                Ok(out) => {
                    let text = out.to_string();
                    if !text.is_empty() {
                        println!("{}", text);
                    }
                }
                Err(e) => println!("error: {}", e),
            },
            Ok(None) => {}
            Err(e) => println!("error: {}", e),
        }
        print!("% ");
        stdout.flush()?;
    }

    fs.unmount()?;
    Ok(())
}
