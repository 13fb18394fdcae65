//! Source recipes: how a module's upstream source is obtained.
//!
//! A module's `source.txt` holds one command line, e.g.
//!
//! ```text
//! wget http://csdms.colorado.edu/pub/models/cem/cem-0.2.tar.gz
//! svn co https://csdms.colorado.edu/svn/cem/trunk
//! ```
//!
//! The first word selects the fetch tool and the remaining words are
//! passed to it. Only known tools are accepted. `{name}` and `{version}`
//! in the arguments are replaced with the module's name and version.

use std::fmt;
use std::path::Path;

use crate::core::errors::PackagerError;

/// Tools that download a file already in final archive form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectTool {
    Wget,
    Curl,
}

impl DirectTool {
    /// Arguments directing the download into `output`.
    pub fn output_args(self, output: &Path) -> Vec<String> {
        let output = output.to_string_lossy().into_owned();
        match self {
            DirectTool::Wget => vec!["-O".to_string(), output],
            DirectTool::Curl => vec!["-f".to_string(), "-L".to_string(), "-o".to_string(), output],
        }
    }
}

/// Source-control tools that check out a tree into a target directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutTool {
    Git,
    Svn,
    Hg,
    Bzr,
}

/// Parsed `source.txt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRecipe {
    /// Fetch a ready-made archive.
    DirectFile {
        tool: DirectTool,
        program: String,
        args: Vec<String>,
    },
    /// Check out a tree which is then packed into an archive.
    Checkout {
        tool: CheckoutTool,
        program: String,
        args: Vec<String>,
    },
}

impl SourceRecipe {
    /// Parse a recipe line for `module`.
    pub fn parse(module: &str, line: &str) -> Result<Self, PackagerError> {
        let invalid = |reason: String| PackagerError::InvalidSourceRecipe {
            module: module.to_string(),
            reason,
        };

        let mut words = shell_words::split(line.trim())
            .map_err(|e| invalid(format!("cannot split `{}`: {}", line.trim(), e)))?
            .into_iter();
        let program = words
            .next()
            .ok_or_else(|| invalid("the recipe is empty".to_string()))?;
        let args: Vec<String> = words.collect();

        let tool_name = Path::new(&program)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| program.clone());

        let recipe = match tool_name.as_str() {
            "wget" => SourceRecipe::DirectFile {
                tool: DirectTool::Wget,
                program,
                args,
            },
            "curl" => SourceRecipe::DirectFile {
                tool: DirectTool::Curl,
                program,
                args,
            },
            "git" => SourceRecipe::Checkout {
                tool: CheckoutTool::Git,
                program,
                args,
            },
            "svn" => SourceRecipe::Checkout {
                tool: CheckoutTool::Svn,
                program,
                args,
            },
            "hg" => SourceRecipe::Checkout {
                tool: CheckoutTool::Hg,
                program,
                args,
            },
            "bzr" => SourceRecipe::Checkout {
                tool: CheckoutTool::Bzr,
                program,
                args,
            },
            _ => {
                return Err(PackagerError::UnknownFetchTool {
                    module: module.to_string(),
                    tool: tool_name,
                })
            }
        };

        Ok(recipe)
    }

    /// Read the first line of `path` and parse it.
    pub fn read(module: &str, path: &Path) -> Result<Self, PackagerError> {
        let text = std::fs::read_to_string(path).map_err(|e| PackagerError::InvalidSourceRecipe {
            module: module.to_string(),
            reason: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::parse(module, text.lines().next().unwrap_or(""))
    }

    /// Replace `{name}` and `{version}` in the arguments.
    pub fn expand(mut self, name: &str, version: &str) -> Self {
        let args = match &mut self {
            SourceRecipe::DirectFile { args, .. } | SourceRecipe::Checkout { args, .. } => args,
        };
        for arg in args.iter_mut() {
            *arg = arg.replace("{name}", name).replace("{version}", version);
        }
        self
    }

    pub fn program(&self) -> &str {
        match self {
            SourceRecipe::DirectFile { program, .. } | SourceRecipe::Checkout { program, .. } => {
                program
            }
        }
    }

    pub fn args(&self) -> &[String] {
        match self {
            SourceRecipe::DirectFile { args, .. } | SourceRecipe::Checkout { args, .. } => args,
        }
    }
}

impl fmt::Display for SourceRecipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut words = vec![self.program()];
        words.extend(self.args().iter().map(String::as_str));
        f.write_str(&shell_words::join(words))
    }
}
