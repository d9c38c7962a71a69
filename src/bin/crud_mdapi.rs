//! Read and upsert metadata components with the CRUD Metadata API.
//!
//! ```sh
//! export SF_INSTANCE_URL='https://mydomain.my.salesforce.com'
//! export SF_ACCESS_TOKEN='00D...'
//! crud-mdapi read Profile:Admin CustomField:Account.Industry
//! crud-mdapi read force-app/main/default/profiles/Admin.profile-meta.xml
//! crud-mdapi upsert Profile:Admin RecordType:Account.Business
//! crud-mdapi upsert force-app/main/default/objects/Account/fields/Industry.field-meta.xml
//! crud-mdapi upsert manifest/package.xml
//! ```
//!
//! Each operand is a `Type:Name` entry, a source file (`...-meta.xml`) or a
//! `package.xml` manifest (any other `.xml` file). `Type:Name` entries are
//! looked up in the package directories of `sfdx-project.json` when the
//! current directory has one, otherwise in `SF_OUTPUT_DIR`. Upserts need the
//! source file to exist; reads write back to it when it does.
//!
//! `SF_OUTPUT_DIR` (default `force-app/main/default`) is where new read
//! components are written; `SF_CHUNK_SIZE` overrides the batch size.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use busbar_sf_metadata::MetadataClient;
use busbar_sf_source::{
    parse_component_name, resolve_source_path, ComponentIdentifier, CrudClient, CrudConfig,
    DirectoryWriter, Error, ErrorKind, Manifest, MergeWriter, PackageDirectories, Result,
    TypeRegistry, PROJECT_FILE,
};
use busbar_sf_source::materialize::META_SUFFIX;
use tracing_subscriber::EnvFilter;

const DEFAULT_OUTPUT_DIR: &str = "force-app/main/default";

const USAGE: &str = "usage: crud-mdapi read <Type:Name|path|package.xml>...\n       crud-mdapi upsert <Type:Name|path|package.xml>...";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((command, operands)) = args.split_first() else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };
    if operands.is_empty() || !matches!(command.as_str(), "read" | "upsert") {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    }

    match run(command, operands).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: &str, operands: &[String]) -> Result<()> {
    let client = CrudClient::new(MetadataClient::from_env()?).with_config(config_from_env()?);
    let registry = client.registry();

    let output_dir = PathBuf::from(
        std::env::var("SF_OUTPUT_DIR").unwrap_or_else(|_| DEFAULT_OUTPUT_DIR.to_string()),
    );
    let packages = package_directories(&output_dir)?;

    let mut identifiers = Vec::new();
    for operand in operands {
        identifiers.extend(resolve_operand(registry, &packages, operand)?);
    }

    if command == "upsert" {
        let identifiers = identifiers
            .into_iter()
            .map(|id| match id.source_path {
                Some(_) => Ok(id),
                None => packages.resolve(registry, &id),
            })
            .collect::<Result<Vec<_>>>()?;
        let upserted = client.upsert_components(&identifiers).await?;
        print_table(
            ["NAME", "TYPE", "RESULT"],
            upserted.iter().map(|u| {
                let result = if u.created { "Created" } else { "Updated" };
                [u.full_name.clone(), u.type_name.clone(), result.to_string()]
            }),
        );
        return Ok(());
    }

    let identifiers = identifiers
        .into_iter()
        .map(|id| match id.source_path {
            Some(_) => Ok(id),
            None => Ok(match packages.find(registry, &id)? {
                Some(path) => id.with_source_path(path),
                None => id,
            }),
        })
        .collect::<Result<Vec<_>>>()?;
    let components = client.read(&identifiers).await?;

    let written = DirectoryWriter::new(registry.clone()).write(&components, &output_dir)?;
    print_table(
        ["NAME", "TYPE", "PATH"],
        written.iter().map(|w| {
            [
                w.full_name.clone(),
                w.type_name.clone(),
                w.file_path.display().to_string(),
            ]
        }),
    );
    Ok(())
}

/// Package directories of the project in the current directory, or the
/// output directory alone.
fn package_directories(output_dir: &Path) -> Result<PackageDirectories> {
    if Path::new(PROJECT_FILE).is_file() {
        PackageDirectories::from_project(Path::new("."))
    } else {
        Ok(PackageDirectories::new([output_dir.to_path_buf()]))
    }
}

/// An operand is a `package.xml` manifest, a source file or `Type:Name`.
fn resolve_operand(
    registry: &TypeRegistry,
    packages: &PackageDirectories,
    operand: &str,
) -> Result<Vec<ComponentIdentifier>> {
    let path = PathBuf::from(operand);
    if operand.ends_with(".xml") && !operand.ends_with(META_SUFFIX) {
        Manifest::from_file(&path)?.components(registry, packages)
    } else if operand.ends_with(META_SUFFIX) || path.is_file() {
        Ok(vec![resolve_source_path(registry, &path)?])
    } else {
        Ok(vec![parse_component_name(operand)?])
    }
}

fn config_from_env() -> Result<CrudConfig> {
    let builder = CrudConfig::builder();
    let builder = match std::env::var("SF_CHUNK_SIZE") {
        Ok(value) => {
            let size = value.trim().parse::<usize>().map_err(|e| {
                Error::with_source(
                    ErrorKind::Config(format!("SF_CHUNK_SIZE must be a number, got '{}'", value)),
                    e,
                )
            })?;
            builder.with_chunk_size(size)
        }
        Err(_) => builder,
    };
    Ok(builder.build())
}

fn print_table<const N: usize>(header: [&str; N], rows: impl Iterator<Item = [String; N]>) {
    let rows: Vec<[String; N]> = rows.collect();
    let mut widths = header.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    println!("{}", format_row(&header, &widths));
    for row in &rows {
        println!("{}", format_row(&row.each_ref().map(String::as_str), &widths));
    }
}

fn format_row(cells: &[&str], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}
