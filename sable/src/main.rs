#![forbid(unsafe_code)]

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{miette, IntoDiagnostic, NamedSource, Report, Result};
use sable_import::{import_libs, import_methods};
use sable_ir::{dump_graph, Constant, Module, QualifiedName, TypeRegistry};

#[derive(Parser)]
#[command(name = "sable", about = "Re-import serialized sable definitions into IR")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import serialized methods onto a fresh module instance and dump them.
    Methods {
        file: PathBuf,
        /// Constant-table entry, repeatable, in index order.
        #[arg(long = "constant")]
        constants: Vec<f64>,
    },
    /// Import serialized classes and dump every registered type.
    Libs {
        file: PathBuf,
        /// Qualified-name prefix for freshly created class types.
        #[arg(long, default_value = "__sable__")]
        qualifier: String,
        /// Constant-table entry, repeatable, in index order.
        #[arg(long = "constant")]
        constants: Vec<f64>,
    },
}

fn main() -> Result<()> {
    match Cli::parse().command {
        Command::Methods { file, constants } => {
            let src = fs::read_to_string(&file).into_diagnostic()?;
            let constants: Vec<Constant> =
                constants.into_iter().map(Constant::Float).collect();

            let mut registry = TypeRegistry::new();
            let ty = registry
                .create(QualifiedName::from_dotted("__sable__.Module").expect("valid name"))
                .expect("fresh registry");
            let module = Module { ty };

            import_methods(module, &src, &constants, &mut registry, |dep| {
                eprintln!("depends on: {dep}");
            })
            .map_err(|e| attach(e, &file, &src))?;

            for f in registry.class(module.ty).unit.iter() {
                println!("def {}:", f.name);
                print!("{}", dump_graph(&f.graph));
            }
            Ok(())
        }
        Command::Libs {
            file,
            qualifier,
            constants,
        } => {
            let src = fs::read_to_string(&file).into_diagnostic()?;
            let constants: Vec<Constant> =
                constants.into_iter().map(Constant::Float).collect();
            let qualifier = QualifiedName::from_dotted(&qualifier)
                .ok_or_else(|| miette!("invalid qualifier '{qualifier}'"))?;

            let mut registry = TypeRegistry::new();
            import_libs(&qualifier, &src, &constants, &mut registry, |dep| {
                eprintln!("depends on: {dep}");
            })
            .map_err(|e| attach(e, &file, &src))?;

            for (_, class) in registry.iter() {
                println!("class {}:", class.name);
                for f in class.unit.iter() {
                    println!("  def {}:", f.name);
                    print!("{}", indent(&dump_graph(&f.graph)));
                }
            }
            Ok(())
        }
    }
}

fn attach(err: sable_import::ImportError, file: &PathBuf, src: &str) -> Report {
    Report::new(err)
        .with_source_code(NamedSource::new(file.display().to_string(), src.to_string()))
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|l| format!("    {l}\n"))
        .collect()
}
