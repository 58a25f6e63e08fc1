//! Shell commands: parsing a line into a `Command` and running it against a `FileSystem`.

use core::fmt;

use crate::directory::LsEntry;
use crate::error::{FsError, Result};
use crate::file::FileStat;
use crate::fs::FsStat;
use crate::{BlockDevice, FileSystem};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Create { name: String, size: usize },
    Cat { name: String },
    Write { name: String, offset: usize, size: usize, data: Vec<u8> },
    Read { name: String, offset: usize, size: usize },
    Rm { name: String },
    Mkdir { name: String },
    Rmdir { name: String },
    Cd { name: String },
    Ls,
    Stat { name: String },
    Df,
    Quit,
}

/// Result of a successful command, ready to be printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Done,
    FileCreated { name: String, inode_id: u32, size: usize },
    DirCreated { name: String, inode_id: u32 },
    Data(Vec<u8>),
    Written(Vec<u8>),
    Listing(Vec<LsEntry>),
    Stat(FileStat),
    Df(FsStat),
}

/// Parses a count argument; negative and non-numeric values are rejected.
fn parse_count(arg: &str, what: &'static str) -> Result<usize> {
    match arg.parse::<i64>() {
        Ok(n) if n < 0 => Err(FsError::InvalidArgument(what)),
        Ok(n) => usize::try_from(n).map_err(|_| FsError::InvalidArgument(what)),
        Err(_) => Err(FsError::InvalidArgument("expected a number")),
    }
}

impl Command {
    /// Splits `line` into a command word and up to four arguments.
    /// Returns None for a blank line.
    pub fn parse(line: &str) -> Result<Option<Command>> {
        let mut tokens = line.split_whitespace();
        let Some(word) = tokens.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = tokens.take(4).collect();
        let need = |n: usize, usage: &'static str| {
            if args.len() < n {
                Err(FsError::Usage(usage))
            } else {
                Ok(())
            }
        };

        let cmd = match word {
            "create" => {
                need(2, "create <filename> <size>")?;
                Command::Create {
                    name: args[0].to_string(),
                    size: parse_count(args[1], "size must not be negative")?,
                }
            }
            "cat" => {
                need(1, "cat <filename>")?;
                Command::Cat { name: args[0].to_string() }
            }
            "write" => {
                need(4, "write <filename> <offset> <size> <buf>")?;
                Command::Write {
                    name: args[0].to_string(),
                    offset: parse_count(args[1], "offset must not be negative")?,
                    size: parse_count(args[2], "size must not be negative")?,
                    data: args[3].as_bytes().to_vec(),
                }
            }
            "read" => {
                need(3, "read <filename> <offset> <size>")?;
                Command::Read {
                    name: args[0].to_string(),
                    offset: parse_count(args[1], "offset must not be negative")?,
                    size: parse_count(args[2], "size must not be negative")?,
                }
            }
            "rm" => {
                need(1, "rm <filename>")?;
                Command::Rm { name: args[0].to_string() }
            }
            "mkdir" => {
                need(1, "mkdir <dirname>")?;
                Command::Mkdir { name: args[0].to_string() }
            }
            "rmdir" => {
                need(1, "rmdir <dirname>")?;
                Command::Rmdir { name: args[0].to_string() }
            }
            "cd" => {
                need(1, "cd <dirname>")?;
                Command::Cd { name: args[0].to_string() }
            }
            "ls" => Command::Ls,
            "stat" => {
                need(1, "stat <filename>")?;
                Command::Stat { name: args[0].to_string() }
            }
            "df" => Command::Df,
            "quit" | "exit" => Command::Quit,
            other => return Err(FsError::UnknownCommand(other.to_string())),
        };
        Ok(Some(cmd))
    }

    pub fn execute<D: BlockDevice>(&self, fs: &mut FileSystem<D>) -> Result<Output> {
        let out = match self {
            Command::Create { name, size } => {
                let inode_id = fs.create(name, *size)?;
                Output::FileCreated { name: name.clone(), inode_id, size: *size }
            }
            Command::Cat { name } => Output::Data(fs.cat(name)?),
            Command::Write { name, offset, size, data } => {
                fs.write(name, *offset, *size, data)?;
                Output::Written(fs.cat(name)?)
            }
            Command::Read { name, offset, size } => Output::Data(fs.read(name, *offset, *size)?),
            Command::Rm { name } => {
                fs.remove(name)?;
                Output::Done
            }
            Command::Mkdir { name } => {
                let inode_id = fs.mkdir(name)?;
                Output::DirCreated { name: name.clone(), inode_id }
            }
            Command::Rmdir { name } => {
                fs.rmdir(name)?;
                Output::Done
            }
            Command::Cd { name } => {
                fs.cd(name)?;
                Output::Done
            }
            Command::Ls => Output::Listing(fs.ls().collect()),
            Command::Stat { name } => Output::Stat(fs.stat(name)?),
            Command::Df => Output::Df(fs.df()),
            Command::Quit => Output::Done,
        };
        Ok(out)
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Done => Ok(()),
            Output::FileCreated { name, inode_id, size } => {
                write!(f, "File created: {}, inode {}, size {}", name, inode_id, size)
            }
            Output::DirCreated { name, inode_id } => {
                write!(f, "Directory created: {}, inode {}", name, inode_id)
            }
            Output::Data(data) | Output::Written(data) => {
                write!(f, "{}", String::from_utf8_lossy(data))
            }
            Output::Listing(entries) => {
                for (i, entry) in entries.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}", entry)?;
                }
                Ok(())
            }
            Output::Stat(stat) => write!(f, "{}", stat),
            Output::Df(stat) => write!(f, "{}", stat),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_blank() {
        assert_eq!(Command::parse("   \n").unwrap(), None);
    }

    #[test]
    fn test_parse_write() {
        let cmd = Command::parse("write f 0 5 HELLO\n").unwrap().unwrap();
        assert_eq!(
            cmd,
            Command::Write { name: "f".into(), offset: 0, size: 5, data: b"HELLO".to_vec() }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(Command::parse("create f"), Err(FsError::Usage(_))));
        assert!(matches!(Command::parse("read f -1 4"), Err(FsError::InvalidArgument(_))));
        assert!(matches!(Command::parse("read f 0 x"), Err(FsError::InvalidArgument(_))));
        assert!(matches!(Command::parse("format"), Err(FsError::UnknownCommand(_))));
    }

    #[test]
    fn test_parse_extra_args_ignored() {
        let cmd = Command::parse("cd a b c d e f").unwrap().unwrap();
        assert_eq!(cmd, Command::Cd { name: "a".into() });
        assert_eq!(Command::parse("exit").unwrap(), Some(Command::Quit));
    }
}
