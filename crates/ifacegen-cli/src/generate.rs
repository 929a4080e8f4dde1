//! Per-input compilation and IR output

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ifacegen_parser::{Compilation, ModuleLoader};
use tracing::{debug, info};

use crate::config::GeneratorConfig;

/// Where the IR of one input ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    File(PathBuf),
    Stdout,
}

/// Parse one IDL file with a fresh loader.
pub fn compile(path: &Path, config: &GeneratorConfig) -> Result<Compilation> {
    let compilation = ModuleLoader::new(config.naming.clone()).load(path)?;
    Ok(compilation)
}

pub fn render_ir(compilation: &Compilation) -> Result<String> {
    serde_json::to_string_pretty(&compilation.ir()).context("Failed to serialize module IR")
}

/// One line per local type, then one per method.
pub fn write_summary<W: Write + ?Sized>(compilation: &Compilation, out: &mut W) -> io::Result<()> {
    let Compilation { arena, module } = compilation;
    writeln!(out, "module {}", module.name)?;
    for (_, id) in module.registry.local_types() {
        writeln!(out, "  {}", arena.display(id))?;
    }
    for method in &module.methods {
        writeln!(out, "  {}", method.display(arena))?;
    }
    Ok(())
}

/// Compile `path` and write its IR as configured.
pub fn process_iface(path: &Path, config: &GeneratorConfig) -> Result<Output> {
    process_iface_to(path, config, &mut io::stdout().lock(), &mut io::stderr().lock())
}

/// Like [`process_iface`] with explicit streams. With `to_stdout` the IR owns
/// `out`, so the verbose summary moves to `diag`.
pub fn process_iface_to(
    path: &Path,
    config: &GeneratorConfig,
    out: &mut impl Write,
    diag: &mut impl Write,
) -> Result<Output> {
    info!("Processing {}", path.display());
    let compilation = compile(path, config)?;

    if config.verbose {
        let sink: &mut dyn Write = if config.to_stdout {
            &mut *diag
        } else {
            &mut *out
        };
        write_summary(&compilation, sink).context("Failed to write summary")?;
    }

    let ir = render_ir(&compilation)?;
    if config.to_stdout {
        writeln!(out, "{}", ir).context("Failed to write module IR")?;
        return Ok(Output::Stdout);
    }

    fs::create_dir_all(&config.outdir).with_context(|| {
        format!("Failed to create output directory: {}", config.outdir.display())
    })?;
    let target = config.outdir.join(format!("{}.json", compilation.module.name));
    fs::write(&target, ir)
        .with_context(|| format!("Failed to write output: {}", target.display()))?;
    debug!("Wrote {}", target.display());
    Ok(Output::File(target))
}

/// Process every input, reporting failures on stdout and carrying on.
/// Returns the number of inputs that failed.
pub fn run(inputs: &[PathBuf], config: &GeneratorConfig) -> usize {
    let mut failures = 0;
    for input in inputs {
        match process_iface(input, config) {
            Ok(Output::File(target)) => info!("{} -> {}", input.display(), target.display()),
            Ok(Output::Stdout) => {}
            Err(err) => {
                failures += 1;
                println!("Failed to process {}: {:#}", input.display(), err);
            }
        }
    }
    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifacegen_core::NamingConfig;
    use ifacegen_parser::parse_value;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_summary_lists_types_and_methods() {
        let document = json!({"iface": [
            {"struct": "Point", "typedef": {"x": "int32"}},
            {"procedure": "count", "response": {"count": "int32"}}
        ]});
        let compilation = parse_value("geo", &document, &NamingConfig::new()).unwrap();
        let mut buffer = Vec::new();
        write_summary(&compilation, &mut buffer).unwrap();
        let summary = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines[0], "module geo");
        assert!(lines[1].contains("Point"));
        assert!(lines[2].starts_with("  method count"));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_verbose_stdout_keeps_ir_stream_clean() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = dir.path().join("geo.json");
        fs::write(
            &input,
            json!({"iface": [{"struct": "Point", "typedef": {"x": "int32"}}]}).to_string(),
        )
        .unwrap();

        let config = GeneratorConfig {
            verbose: true,
            to_stdout: true,
            ..GeneratorConfig::default()
        };
        let (mut out, mut diag) = (Vec::new(), Vec::new());
        let output = process_iface_to(&input, &config, &mut out, &mut diag).unwrap();
        assert_eq!(output, Output::Stdout);

        let ir: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(ir["name"], json!("geo"));
        assert!(String::from_utf8(diag).unwrap().starts_with("module geo"));
    }

    #[test]
    fn test_verbose_file_output_prints_summary() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = dir.path().join("geo.json");
        fs::write(&input, json!({"iface": []}).to_string()).unwrap();

        let config = GeneratorConfig {
            verbose: true,
            outdir: dir.path().join("gen"),
            ..GeneratorConfig::default()
        };
        let (mut out, mut diag) = (Vec::new(), Vec::new());
        process_iface_to(&input, &config, &mut out, &mut diag).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "module geo\n");
        assert!(diag.is_empty());
    }

    #[test]
    fn test_render_ir_is_json() {
        let document = json!({"iface": [{"struct": "Point", "typedef": {"x": "int32"}}]});
        let compilation = parse_value("geo", &document, &NamingConfig::new()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&render_ir(&compilation).unwrap()).unwrap();
        assert_eq!(value["name"], json!("geo"));
        assert_eq!(value["structs"], json!(["Point"]));
    }
}
