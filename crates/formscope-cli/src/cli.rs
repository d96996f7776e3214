use crate::error::Result;
use crate::project::{path_to_uri, read_file, Project};
use crate::report::{
    option_reports, ClassReport, DefaultKeysReport, ExtensionsReport, TemplateReport,
    ViewVarsReport,
};
use clap::{Parser, Subcommand};
use formscope_index::twig_paths::twig_paths;
use formscope_parser::twig::{
    blocks_in_file, extends_tag_templates, include_tag_templates, tags_in_file,
};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(
    name = "formscope",
    about = "Static analysis of Symfony form types and Twig templates",
    version
)]
pub struct Cli {
    /// JSON file overriding the analysis configuration.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Compiled service container dump (XML).
    #[arg(long, value_name = "FILE")]
    pub container: Option<PathBuf>,

    /// Project root to index.
    pub project_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Every option of a form type, including parents and extensions.
    Options {
        form_type: String,
    },

    /// Options of a form type and its parents with their declaring class.
    #[command(name = "default-keys")]
    DefaultKeys {
        form_type: String,
    },

    /// Extensions registered against form types and the options they add.
    Extensions {
        #[arg(required = true)]
        form_types: Vec<String>,
    },

    /// Variables form types expose to templates.
    #[command(name = "view-vars")]
    ViewVars {
        #[arg(required = true)]
        form_types: Vec<String>,
    },

    /// Template directories configured in a Twig YAML file.
    #[command(name = "twig-paths")]
    TwigPaths {
        config: PathBuf,
    },

    /// Parent templates, includes and blocks of a Twig template.
    Template {
        template: PathBuf,
    },
}

/// Run a parsed command line, writing pretty JSON to `out`.
pub fn run(cli: Cli, out: &mut dyn Write) -> Result<()> {
    let load = || {
        Project::load(
            &cli.project_dir,
            cli.config.as_deref(),
            cli.container.as_deref(),
        )
    };

    match &cli.command {
        Commands::Options { form_type } => {
            let project = load()?;
            let options = project.analyzer().form_options(form_type);
            write_json(out, &option_reports(&options))
        }
        Commands::DefaultKeys { form_type } => {
            let project = load()?;
            let report = DefaultKeysReport {
                form_type: form_type.clone(),
                options: project
                    .analyzer()
                    .form_default_keys(form_type)
                    .into_iter()
                    .collect(),
            };
            write_json(out, &report)
        }
        Commands::Extensions { form_types } => {
            let project = load()?;
            let analyzer = project.analyzer();
            let names = as_strs(form_types);
            let report = ExtensionsReport {
                extensions: analyzer
                    .extended_type_classes(&names)
                    .iter()
                    .map(ClassReport::from)
                    .collect(),
                options: option_reports(&analyzer.form_extension_keys(&names)),
            };
            write_json(out, &report)
        }
        Commands::ViewVars { form_types } => {
            let project = load()?;
            let report = ViewVarsReport {
                form_types: form_types.clone(),
                vars: project.analyzer().form_view_vars(&as_strs(form_types)),
            };
            write_json(out, &report)
        }
        Commands::TwigPaths { config } => {
            let path = resolve(&cli.project_dir, config);
            let paths = twig_paths(&read_file(&path)?)?;
            write_json(out, &paths)
        }
        Commands::Template { template } => {
            let path = resolve(&cli.project_dir, template);
            let source = read_file(&path)?;
            let tags = tags_in_file(&source);
            let report = TemplateReport {
                extends: tags.iter().flat_map(extends_tag_templates).collect(),
                includes: tags.iter().flat_map(include_tag_templates).collect(),
                blocks: blocks_in_file(&source, &path_to_uri(&path)),
            };
            write_json(out, &report)
        }
    }
}

fn as_strs(values: &[String]) -> Vec<&str> {
    values.iter().map(String::as_str).collect()
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

fn write_json<T: Serialize>(out: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out).map_err(serde_json::Error::io)?;
    Ok(())
}
