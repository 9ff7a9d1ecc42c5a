//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod build;
pub mod check;
pub mod clean;
pub mod exclude;
pub mod init;

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;

use crate::infra::state::ExclusionMark;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new esmake project
    Init {
        /// Project name (defaults to the directory name)
        #[arg(short, long)]
        name: Option<String>,

        /// Overwrite an existing manifest and starter configuration file
        #[arg(short, long)]
        force: bool,
    },

    /// Compile the configurations affected by changes since the last build
    Build {
        /// Rebuild every configuration regardless of recorded changes
        #[arg(long)]
        full: bool,

        /// Compiler executable to invoke
        #[arg(long, value_name = "PATH")]
        compiler: Option<PathBuf>,

        /// Kill a compiler invocation after this many seconds
        #[arg(long, value_name = "SECONDS")]
        timeout: Option<u64>,
    },

    /// Discard build records so the next build starts from scratch
    Clean,

    /// Validate configuration files and settings without building
    Check,

    /// Mark files or folders as excluded from every build
    Exclude {
        /// Project-relative paths to exclude
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Mark files or folders as included in builds again
    Include {
        /// Project-relative paths to include
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

impl Commands {
    /// Execute the command
    pub fn run(self) -> Result<()> {
        match self {
            Self::Init { name, force } => {
                let current_dir = std::env::current_dir()?;
                init::execute(&current_dir, name, force)
            }
            Self::Build {
                full,
                compiler,
                timeout,
            } => {
                let current_dir = std::env::current_dir()?;
                let options = build::BuildOptions {
                    full,
                    compiler,
                    timeout,
                };
                build::execute(&current_dir, options)
            }
            Self::Clean => {
                let current_dir = std::env::current_dir()?;
                clean::execute(&current_dir)
            }
            Self::Check => {
                let current_dir = std::env::current_dir()?;
                check::execute(&current_dir)
            }
            Self::Exclude { paths } => {
                let current_dir = std::env::current_dir()?;
                exclude::execute(&current_dir, &paths, ExclusionMark::Excluded)
            }
            Self::Include { paths } => {
                let current_dir = std::env::current_dir()?;
                exclude::execute(&current_dir, &paths, ExclusionMark::Included)
            }
        }
    }
}
