//! Test fixtures for module directories and repository archives.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Fixture for one module's packaging metadata directory.
#[derive(Debug, Clone)]
pub struct ModuleFixture {
    /// Module name (also the directory name).
    pub name: String,
    /// `source.txt` content.
    pub source: String,
    /// `dependencies.txt` content, if the module has one.
    pub dependencies: Option<String>,
    /// Extra files (name -> content), e.g. patches.
    pub extra_files: Vec<(String, String)>,
}

impl ModuleFixture {
    /// A module whose source is a git checkout.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        ModuleFixture {
            source: format!("git clone https://github.com/csdms/{}\n", name),
            name,
            dependencies: None,
            extra_files: Vec::new(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_dependencies(mut self, deps: impl Into<String>) -> Self {
        self.dependencies = Some(deps.into());
        self
    }

    pub fn with_file(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.extra_files.push((name.into(), content.into()));
        self
    }

    /// `(relative path, content)` for every file of the module.
    fn files(&self) -> Vec<(String, String)> {
        let mut files = vec![
            ("source.txt".to_string(), self.source.clone()),
            (
                format!("{}.spec", self.name),
                format!("Name: {}\nVersion: %{{_version}}\n", self.name),
            ),
        ];
        if let Some(deps) = &self.dependencies {
            files.push(("dependencies.txt".to_string(), deps.clone()));
        }
        files.extend(self.extra_files.iter().cloned());
        files
    }

    /// Write the module directory under `base`, returning its path.
    pub fn write_to(&self, base: &Path) -> std::io::Result<PathBuf> {
        let dir = base.join(&self.name);
        std::fs::create_dir_all(&dir)?;
        for (name, content) in self.files() {
            std::fs::write(dir.join(name), content)?;
        }
        Ok(dir)
    }
}

/// Fixture for a repository of module directories.
#[derive(Debug, Clone)]
pub struct RepositoryFixture {
    /// `owner/name` identifier.
    pub id: String,
    /// Branch named in the archive's wrapping directory.
    pub branch: String,
    /// Modules held by the repository.
    pub modules: Vec<ModuleFixture>,
}

impl RepositoryFixture {
    pub fn new(id: impl Into<String>) -> Self {
        RepositoryFixture {
            id: id.into(),
            branch: "master".to_string(),
            modules: Vec::new(),
        }
    }

    pub fn with_module(mut self, module: ModuleFixture) -> Self {
        self.modules.push(module);
        self
    }

    fn base_name(&self) -> &str {
        self.id.rsplit('/').next().unwrap_or(&self.id)
    }

    /// Write `<dir>/<base>.zip` laid out like a hosted branch snapshot.
    pub fn write_zip(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let path = dir.join(format!("{}.zip", self.base_name()));
        let file = File::create(&path)?;
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        let root = format!("{}-{}/", self.base_name(), self.branch);
        zip.add_directory(root.as_str(), options)?;
        zip.start_file(format!("{}README.md", root), options)?;
        zip.write_all(b"packaging metadata\n")?;

        for module in &self.modules {
            zip.add_directory(format!("{}{}/", root, module.name), options)?;
            for (name, content) in module.files() {
                zip.start_file(format!("{}{}/{}", root, module.name, name), options)?;
                zip.write_all(content.as_bytes())?;
            }
        }

        zip.finish()?;
        Ok(path)
    }
}
