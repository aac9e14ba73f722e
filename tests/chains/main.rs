// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::path::Path;

use anyhow::{anyhow, bail, Result};
use chain_doctor::frontend::{lower, read_dump, PackageDump};
use chain_doctor::{check, CheckOptions, Manifest};
use serde::Deserialize;
use test_generator::test_resources;

macro_rules! my_assert_eq {
    ($left:expr, $right:expr, $($arg:tt)+) => {
	match (&($left), &($right)) {
            (left_val, right_val) => {
                if !(*left_val == *right_val) {
		    return Err(anyhow!("mismatch:\nleft  = {}\nright = {}\n{}",
		     		       &$left, &$right, format_args!($($arg)+)));
                }
            }
	}
    }
}

#[derive(Deserialize)]
struct TestCase {
    note: String,
    /// Dump files, relative to the crate root.
    #[serde(default)]
    dumps: Vec<String>,
    /// Inline dumps, loaded before `dumps`.
    #[serde(default)]
    packages: Vec<PackageDump>,
    #[serde(default)]
    manifest: Option<String>,
    #[serde(default)]
    verbose: bool,
    #[serde(default)]
    want: Option<Vec<String>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct YamlTest {
    cases: Vec<TestCase>,
}

fn check_case(
    packages: Vec<PackageDump>,
    dumps: &[String],
    manifest: Option<&str>,
    verbose: bool,
) -> Result<Vec<String>> {
    let mut all = packages;
    for path in dumps {
        all.push(read_dump(Path::new(path))?);
    }
    let program = lower(&all)?;
    let manifest = match manifest {
        Some(path) => Some(Manifest::from_path(Path::new(path))?),
        None => None,
    };
    let report = check(&program, &CheckOptions { verbose, manifest })?;
    Ok(report.lines())
}

fn yaml_test_impl(file: &str) -> Result<()> {
    println!("\nrunning {file}");

    let yaml_str = std::fs::read_to_string(file)?;
    let test: YamlTest = serde_yaml::from_str(&yaml_str)?;
    let count = test.cases.len();

    for case in test.cases {
        print!("\ncase {} ", case.note);
        let TestCase {
            dumps,
            packages,
            manifest,
            verbose,
            want,
            error,
            ..
        } = case;

        match check_case(packages, &dumps, manifest.as_deref(), verbose) {
            Ok(lines) => {
                if let Some(e) = &error {
                    bail!("error `{}` not raised.", e);
                }
                let want = want.unwrap_or_default();
                my_assert_eq!(
                    lines.join("\n"),
                    want.join("\n"),
                    "mismatch in report"
                );
            }
            Err(actual) => match &error {
                Some(expected) => {
                    let actual = format!("{actual:#}");
                    if !actual.contains(expected.as_str()) {
                        bail!(
                            "Error message\n`{}\n`\ndoes not contain `{}`",
                            actual,
                            expected
                        );
                    }
                    println!("{actual}");
                }
                _ => return Err(actual),
            },
        }

        println!("passed");
    }

    println!("{count} cases passed.");
    Ok(())
}

fn yaml_test(file: &str) -> Result<()> {
    match yaml_test_impl(file) {
        Ok(_) => Ok(()),
        Err(e) => {
            // If Err is returned, it doesn't always get printed by cargo test.
            // Therefore, panic with the error.
            panic!("{}", e);
        }
    }
}

#[test_resources("tests/chains/**/*.yaml")]
fn run(path: &str) {
    yaml_test(path).unwrap()
}
