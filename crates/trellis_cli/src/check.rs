//! `trellis check` — compile layouts in parallel and report failures.

use rayon::prelude::*;
use trellis_config::{resolve_all, resolve_layout, ResolvedLayout};
use trellis_template::{CompilationError, Compiler, DefaultCompiler};

use crate::project::load_project;
use crate::{CheckArgs, GlobalArgs};

/// One failed source of a layout.
struct Failure {
    layout: String,
    source: String,
    error: CompilationError,
}

/// Runs the `trellis check` command.
///
/// Compiles the production and development sources of every selected layout.
/// Returns exit code 0 if all compile, 1 otherwise.
pub fn run(args: &CheckArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let layouts = if args.layouts.is_empty() {
        resolve_all(&project.config, &project.root)
    } else {
        args.layouts
            .iter()
            .map(|name| resolve_layout(&project.config, &project.root, name))
            .collect::<Result<Vec<_>, _>>()?
    };

    if layouts.is_empty() {
        if !global.quiet {
            eprintln!("warning: no layouts configured");
        }
        return Ok(0);
    }
    if !global.quiet {
        eprintln!("   Checking {} layout(s)", layouts.len());
    }

    let failures = check_layouts(&DefaultCompiler::new(), &layouts);
    for failure in &failures {
        eprintln!(
            "error[{}]: {} ({})",
            failure.layout, failure.error, failure.source
        );
    }

    if !global.quiet {
        let failed = failures
            .iter()
            .map(|f| f.layout.as_str())
            .collect::<std::collections::BTreeSet<_>>()
            .len();
        eprintln!(
            "   Result: {} ok, {} failed",
            layouts.len() - failed,
            failed
        );
    }

    Ok(if failures.is_empty() { 0 } else { 1 })
}

/// Compiles every source of every layout, returning failures in layout order.
fn check_layouts(compiler: &dyn Compiler, layouts: &[ResolvedLayout]) -> Vec<Failure> {
    layouts
        .par_iter()
        .flat_map_iter(|layout| {
            std::iter::once(&layout.source)
                .chain(layout.dev_source.as_ref())
                .filter_map(|locator| {
                    compiler.compile(locator).err().map(|error| Failure {
                        layout: layout.name.clone(),
                        source: locator.display_name(),
                        error,
                    })
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn project(files: &[(&str, &str)]) -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("trellis.toml"),
            r#"
[layouts.good]
source = "good.html"

[layouts.bad]
source = "bad.html"

[layouts.devbad]
source = "good.html"
dev_source = "devbad.html"
"#,
        )
        .unwrap();
        for (name, content) in files {
            fs::write(tmp.path().join(name), content).unwrap();
        }
        tmp
    }

    fn global(tmp: &TempDir) -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: false,
            config: Some(tmp.path().display().to_string()),
        }
    }

    #[test]
    fn reports_every_failing_source() {
        let tmp = project(&[
            ("good.html", "{{ a }}"),
            ("bad.html", "{{#if a}}"),
            ("devbad.html", "{{/each}}"),
        ]);
        let project = load_project(&global(&tmp)).unwrap();
        let layouts = resolve_all(&project.config, &project.root);
        let failures = check_layouts(&DefaultCompiler::new(), &layouts);
        let names: Vec<_> = failures.iter().map(|f| f.layout.as_str()).collect();
        assert_eq!(names, vec!["bad", "devbad"]);
        assert!(failures[1].source.ends_with("devbad.html"));
    }

    #[test]
    fn exit_code_reflects_failures() {
        let tmp = project(&[
            ("good.html", "ok"),
            ("bad.html", "{{#if a}}"),
            ("devbad.html", "ok"),
        ]);
        let all = CheckArgs { layouts: vec![] };
        assert_eq!(run(&all, &global(&tmp)).unwrap(), 1);

        let good_only = CheckArgs {
            layouts: vec!["good".to_string(), "devbad".to_string()],
        };
        assert_eq!(run(&good_only, &global(&tmp)).unwrap(), 0);
    }

    #[test]
    fn unknown_layout_name_is_an_error() {
        let tmp = project(&[("good.html", "ok")]);
        let args = CheckArgs {
            layouts: vec!["nope".to_string()],
        };
        assert!(run(&args, &global(&tmp)).is_err());
    }

    #[test]
    fn missing_source_file_fails() {
        let tmp = project(&[("good.html", "ok"), ("devbad.html", "ok")]);
        let args = CheckArgs {
            layouts: vec!["bad".to_string()],
        };
        assert_eq!(run(&args, &global(&tmp)).unwrap(), 1);
    }
}
