//! `tlbgen` command-line driver.
//!
//! Exit status: 0 on success, 2 when the library cannot be loaded. Any other
//! failure is logged and aborts the process.

mod args;

use anyhow::Context;
use args::Args;
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter};
use std::process::ExitCode;
use std::rc::Rc;
use tlbgen::{BuildResult, CodegenError, MemoryReader, ModelError, TypeLibrary, load_manifest};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Exit status reported when the library cannot be loaded.
const EXIT_CANNOT_LOAD: u8 = 2;

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(&args);

    match run(&args) {
        Ok(result) => {
            report(&result);
            ExitCode::SUCCESS
        }
        Err(err) if cannot_load(&err) => {
            tracing::error!("{:#}", err);
            ExitCode::from(EXIT_CANNOT_LOAD)
        }
        Err(err) => {
            tracing::error!("{:#}", err);
            std::process::abort();
        }
    }
}

fn init_tracing(args: &Args) {
    let filter = match args.log_directive() {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run(args: &Args) -> anyhow::Result<BuildResult> {
    let generator = args.generator();
    tracing::debug!(
        manifest = %args.manifest.display(),
        dialect = %generator.output_dialect(),
        "generating bindings"
    );

    // The output file is only created once the library has loaded.
    let definition = load_manifest(&args.manifest).map_err(CodegenError::from)?;
    let library =
        TypeLibrary::open(Rc::new(MemoryReader::new(definition))).map_err(CodegenError::from)?;

    let result = match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            generator.generate(&library, BufWriter::new(file))?
        }
        None => generator.generate(&library, io::stdout().lock())?,
    };
    Ok(result)
}

/// Returns true for failures caused by a library that cannot be loaded,
/// including a manifest that cannot be parsed.
fn cannot_load(err: &anyhow::Error) -> bool {
    match err.downcast_ref::<CodegenError>() {
        Some(CodegenError::Model(ModelError::Parse(_))) => true,
        Some(err) => err.is_cannot_load(),
        None => false,
    }
}

fn report(result: &BuildResult) {
    tracing::info!(
        emitted = result.emitted,
        skipped = result.skipped.len(),
        "generated declarations"
    );
    if result.missing_types > 0 {
        tracing::info!(
            "{} referenced types could not be found and were replaced with `__missing_type__`",
            result.missing_types
        );
    }
    if result.types_not_loaded > 0 {
        tracing::info!("{} types could not be loaded", result.types_not_loaded);
    }
    for name in &result.skipped {
        tracing::info!("{} was skipped because its kind is not supported", name);
    }
    for name in &result.dual_interfaces {
        tracing::info!("dispatch half of dual interface {} was skipped", name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tlbgen::model::Status;

    fn args_for(manifest: PathBuf, output: PathBuf) -> Args {
        Args::try_parse_from([
            "tlbgen".into(),
            "--output".into(),
            output.into_os_string(),
            manifest.into_os_string(),
        ])
        .unwrap()
    }

    #[test]
    fn test_run_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("lib.xml");
        let output = dir.path().join("bindings.rs");
        std::fs::write(
            &manifest,
            r#"<typelib name="Lib"><alias name="WORD_T" type="ui2"/></typelib>"#,
        )
        .unwrap();

        let result = run(&args_for(manifest, output.clone())).unwrap();
        assert_eq!(result.emitted, 1);
        assert_eq!(
            std::fs::read_to_string(output).unwrap(),
            "type WORD_T = u16;\n\n"
        );
    }

    #[test]
    fn test_cannot_load_classification() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("bindings.rs");

        let err = run(&args_for(dir.path().join("absent.xml"), output.clone())).unwrap_err();
        assert!(cannot_load(&err));
        assert!(!output.exists());

        let manifest = dir.path().join("broken.xml");
        std::fs::write(&manifest, "<typelib>").unwrap();
        let err = run(&args_for(manifest, output.clone())).unwrap_err();
        assert!(cannot_load(&err));
        assert!(!output.exists());

        let manifest = dir.path().join("bad.xml");
        std::fs::write(
            &manifest,
            r#"<typelib name="L"><union name="U" size="4" alignment="2"/></typelib>"#,
        )
        .unwrap();
        let err = run(&args_for(manifest, output)).unwrap_err();
        assert!(!cannot_load(&err));

        let err = anyhow::Error::from(CodegenError::from(ModelError::external(
            "type_info",
            Status::CANT_LOAD_LIBRARY,
        )));
        assert!(cannot_load(&err));
    }
}
