use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Result;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

const MESSY: &str = "\
Order ID,Product Name,Quantity,Price,Date,Region
1, widget ,3,2.5,2024-01-05,north
1,Widget,3,2.5,01/05/2024,North
2,Gadget,-1,10,2024-01-06,South
3,,4,1.0,2024-01-06,South
4,lptop,,999.99,2024-01-07,East
5,Mouse,2,15,someday,West
";

/// Scratch directory with a raw input file and the binary pointed at it.
struct CleanEnv {
    dir: TempDir,
}

impl CleanEnv {
    fn new(input: &str) -> Result<Self> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("messy.csv"), input)?;
        Ok(Self { dir })
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn sales_clean(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("sales-clean"));
        cmd.current_dir(self.dir.path())
            .env("RUST_LOG", "warn")
            .env_remove("SALES_CLEAN_INPUT")
            .env_remove("SALES_CLEAN_OUTPUT")
            .env_remove("SALES_CLEAN_FILL");
        cmd
    }

    fn clean(&self, input: &str, output: &str) -> Command {
        let mut cmd = self.sales_clean();
        cmd.args(["--input", input, "--output", output]);
        cmd
    }
}

fn read(path: &Path) -> Result<String> {
    Ok(fs::read_to_string(path)?)
}

#[test]
fn cleans_messy_file_end_to_end() -> Result<()> {
    let env = CleanEnv::new(MESSY)?;

    env.clean("messy.csv", "cleaned.csv")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleaned 3 of 6 rows"))
        .stdout(predicate::str::contains("1 missing product, 1 bad date, 0 missing numbers, 1 duplicates"))
        .stdout(predicate::str::contains("Total quantity: 2"))
        .stdout(predicate::str::contains("Total revenue: -2.50"))
        .stdout(predicate::str::contains("Unique products: 3"));

    assert_eq!(
        read(&env.path("cleaned.csv"))?,
        "Order ID,Product Name,Quantity,Price,Date,Region\n\
         1,Widget,3,2.5,2024-01-05,North\n\
         2,Gadget,-1,10.0,2024-01-06,South\n\
         4,Laptop,0,999.99,2024-01-07,East\n"
    );
    Ok(())
}

#[test]
fn recleaning_output_changes_nothing() -> Result<()> {
    let env = CleanEnv::new(MESSY)?;

    env.clean("messy.csv", "once.csv").assert().success();
    env.clean("once.csv", "twice.csv").assert().success();

    assert_eq!(read(&env.path("once.csv"))?, read(&env.path("twice.csv"))?);
    Ok(())
}

#[test]
fn drop_policy_removes_rows_with_missing_numbers() -> Result<()> {
    let env = CleanEnv::new(MESSY)?;

    env.clean("messy.csv", "cleaned.csv")
        .args(["--fill", "drop"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleaned 2 of 6 rows"));

    assert!(!read(&env.path("cleaned.csv"))?.contains("Laptop"));
    Ok(())
}

#[test]
fn missing_input_fails_without_writing_output() -> Result<()> {
    let env = CleanEnv::new(MESSY)?;

    env.clean("absent.csv", "cleaned.csv")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));

    assert!(!env.path("cleaned.csv").exists());
    Ok(())
}

#[test]
fn missing_columns_fail_with_their_names() -> Result<()> {
    let env = CleanEnv::new("Product Name,Date\nWidget,2024-01-05\n")?;

    env.clean("messy.csv", "cleaned.csv")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Quantity, Price"));

    assert!(!env.path("cleaned.csv").exists());
    Ok(())
}

#[test]
fn unwritable_output_fails() -> Result<()> {
    let env = CleanEnv::new(MESSY)?;

    env.clean("messy.csv", "no-such-dir/cleaned.csv")
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not save cleaned data"));
    Ok(())
}

#[test]
fn header_only_input_yields_empty_output_and_zero_metrics() -> Result<()> {
    let env = CleanEnv::new("Product,Qty,Price,Date\n")?;

    env.clean("messy.csv", "cleaned.csv")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total quantity: 0"))
        .stdout(predicate::str::contains("Total revenue: 0.00"))
        .stdout(predicate::str::contains("Unique products: 0"));

    assert_eq!(
        read(&env.path("cleaned.csv"))?,
        "Order ID,Product Name,Quantity,Price,Date,Region\n"
    );
    Ok(())
}

#[test]
fn paths_fall_back_to_environment() -> Result<()> {
    let env = CleanEnv::new(MESSY)?;

    env.sales_clean()
        .env("SALES_CLEAN_INPUT", "messy.csv")
        .env("SALES_CLEAN_OUTPUT", "from-env.csv")
        .assert()
        .success();

    assert!(env.path("from-env.csv").exists());
    Ok(())
}

#[test]
fn metrics_command_reports_json() -> Result<()> {
    let env = CleanEnv::new(MESSY)?;
    env.clean("messy.csv", "cleaned.csv").assert().success();

    let output = env
        .sales_clean()
        .args(["metrics", "--cleaned", "cleaned.csv", "--json"])
        .output()?;
    assert!(output.status.success());

    let metrics: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(metrics["total_quantity"], 2);
    assert_eq!(metrics["total_revenue"], -2.5);
    assert_eq!(metrics["unique_products"], 3);
    Ok(())
}

#[test]
fn report_command_writes_markdown() -> Result<()> {
    let env = CleanEnv::new(MESSY)?;
    env.clean("messy.csv", "cleaned.csv").assert().success();

    env.sales_clean()
        .args([
            "report",
            "--cleaned",
            "cleaned.csv",
            "--from",
            "2024-01-06",
            "--out",
            "report.md",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Report written to report.md."));

    let report = read(&env.path("report.md"))?;
    assert!(report.contains("Generated for 2024-01-06 onward (2 rows)"));
    assert!(report.contains("1. Laptop: 0 units\n2. Gadget: -1 units"));
    assert!(!report.contains("Widget"));
    Ok(())
}

#[test]
fn report_rejects_inverted_range() -> Result<()> {
    let env = CleanEnv::new(MESSY)?;
    env.clean("messy.csv", "cleaned.csv").assert().success();

    env.sales_clean()
        .args(["report", "--cleaned", "cleaned.csv", "--from", "2024-02-01", "--to", "2024-01-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is after"));
    Ok(())
}

#[test]
fn report_filters_by_product() -> Result<()> {
    let env = CleanEnv::new(MESSY)?;
    env.clean("messy.csv", "cleaned.csv").assert().success();

    env.sales_clean()
        .args([
            "report",
            "--cleaned",
            "cleaned.csv",
            "--product",
            "widget",
            "--product",
            "lptop",
            "--out",
            "report.md",
        ])
        .assert()
        .success();

    let report = read(&env.path("report.md"))?;
    assert!(report.contains("Generated for all dates (2 rows)"));
    assert!(report.contains("1. Widget: 3 units\n2. Laptop: 0 units"));
    assert!(!report.contains("Gadget"));
    Ok(())
}

#[test]
fn two_digit_years_land_in_the_right_century() -> Result<()> {
    let env = CleanEnv::new(
        "Product Name,Quantity,Price,Date\n\
         Widget,1,1,5/6/24\n\
         Gadget,1,1,24/05/06\n",
    )?;

    env.clean("messy.csv", "cleaned.csv")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 missing product, 1 bad date"));

    let cleaned = read(&env.path("cleaned.csv"))?;
    assert!(cleaned.contains(",Widget,1,1.0,2024-05-06,"));
    assert!(!cleaned.contains("Gadget"));
    Ok(())
}
