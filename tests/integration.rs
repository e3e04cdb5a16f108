use crescere::units;
use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

const DATA_CONTENTS: &str = "\
CHO fed-batch pilot,exported 2024-05-17,,,,,,\n\
Clone,Rep,t_hr,Vol_mL,VCD,Glc_g_L,Lac_g_L,is_post_feed\n\
A,1,0,100,100000,4.0,0.5,false\n\
A,1,24,100,400000,4.0,0.5,false\n\
A,2,0,100,120000,4.0,0.5,false\n\
A,2,24,100,300000,4.0,0.5,false\n\
B,1,72,100,500000,3.0,1.0,false\n\
B,1,76,110,450000,4.5,1.0,true\n\
B,1,80,110,520000,4.0,1.2,false\n";

fn setup_culture_dir(name: &str) -> PathBuf {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join(name);

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir_all(&test_dir).expect("failed to create test directory");
    fs::write(test_dir.join("data.csv"), DATA_CONTENTS).expect("failed to write data file");

    test_dir
}

fn run_bin(args: &[&str]) {
    let output = bin_command(args).output().expect("failed to execute command");

    let stdout_str =
        std::str::from_utf8(&output.stdout).expect("failed to convert stdout to string");
    let stderr_str =
        std::str::from_utf8(&output.stderr).expect("failed to convert stderr to string");

    assert!(
        output.status.success(),
        "failed to run binary with {args:?}\nstdout:\n{stdout_str}\nstderr:\n{stderr_str}\n"
    );
}

fn bin_command(args: &[&str]) -> Command {
    let bin = PathBuf::from(env!("CARGO_BIN_EXE_crescere"));

    let mut command = Command::new(bin);
    command.args(args).stdin(Stdio::null());
    command
}

fn read_lines(file: &Path) -> Vec<String> {
    let contents = fs::read_to_string(file).expect("failed to read output file");
    contents.lines().map(str::to_owned).collect()
}

fn find_row<'a>(lines: &'a [String], prefix: &str) -> Vec<&'a str> {
    lines
        .iter()
        .find(|line| line.starts_with(prefix))
        .unwrap_or_else(|| panic!("no row starting with {prefix:?}"))
        .split(',')
        .collect()
}

#[test]
fn full_workflow() {
    let test_dir = setup_culture_dir("full_workflow");
    fs::write(test_dir.join("analysis.toml"), "batch_end_hr = 72.0\n")
        .expect("failed to write analysis config");

    let test_dir_str = test_dir.to_str().expect("failed to convert test directory to string");

    run_bin(&["--culture-dir", test_dir_str, "phase", "--start", "0", "--end", "96"]);
    run_bin(&["--culture-dir", test_dir_str, "interval"]);
    run_bin(&["--culture-dir", test_dir_str, "grouped"]);

    let outputs_dir = test_dir.join("outputs");

    // Per-replicate phase kinetics.
    let lines = read_lines(&outputs_dir.join("kinetics_by_clone_rep.csv"));
    assert_eq!(lines[0], "Clone,Rep,mu,IVCD,dX,dG,dL,Y_XG,Y_XL,q_Glc,q_Lac");
    assert_eq!(lines.len(), 4);

    let row = find_row(&lines, "A,1,");
    let mu = (4e5f64.ln() - 1e5f64.ln()) / 24.0;
    assert_eq!(row[2], mu.to_string());
    assert_eq!(row[4], "30000000");
    // Constant glucose: no consumption, an undefined yield and a zero rate.
    assert_eq!(row[5], "0");
    assert_eq!(row[7], "");
    assert_eq!(row[9], "0");

    // Per-clone summary: two replicates of A spread, single B does not.
    let lines = read_lines(&outputs_dir.join("kinetics_by_clone.csv"));
    assert_eq!(
        lines[0],
        "Clone,mu_mean,mu_std,IVCD_mean,IVCD_std,dX_mean,dX_std,dG_mean,dG_std,\
         dL_mean,dL_std,Y_XG_mean,Y_XG_std,Y_XL_mean,Y_XL_std,q_Glc_mean,q_Glc_std,\
         q_Lac_mean,q_Lac_std"
    );
    let row_a = find_row(&lines, "A,");
    assert!(!row_a[1].is_empty());
    assert!(!row_a[2].is_empty());
    let row_b = find_row(&lines, "B,");
    assert!(!row_b[1].is_empty());
    assert_eq!(row_b[2], "");

    // Interval kinetics: every input row passes through.
    let lines = read_lines(&outputs_dir.join("interval_kinetics.csv"));
    assert_eq!(
        lines[0],
        "Clone,Rep,t_hr,Vol_mL,VCD,Glc_g_L,Lac_g_L,is_post_feed,\
         mu,IVCD_tot,dX,dG,dL,Y_XG,Y_XL,q_G,q_L"
    );
    assert_eq!(lines.len(), 8);

    // The first sample of a culture anchors no interval.
    let row = find_row(&lines, "A,1,0,");
    assert!(row[8..].iter().all(|field| field.is_empty()));

    // A post-feed sample anchors no interval either.
    let row = find_row(&lines, "B,1,76,");
    assert!(row[8..].iter().all(|field| field.is_empty()));

    // The sample after the feed pairs with the post-feed reading at 76 h,
    // not with the 72 h sample: 4 h at the average density and volume.
    let row = find_row(&lines, "B,1,80,");
    assert_eq!(row[9], "213400000");
    let mu_b = (5.2e5f64.ln() - 4.5e5f64.ln()) / 4.0;
    assert_eq!(row[8], mu_b.to_string());

    // Grouped summary.
    let lines = read_lines(&outputs_dir.join("results_agg_by_clone_time.csv"));
    assert_eq!(
        lines[0],
        "Clone,t_hr,VCD_avg,VCD_sd,Glc_mM_avg,Glc_mM_sd,Lac_mM_avg,Lac_mM_sd,\
         mu_avg,mu_sd,IVCD_tot_avg,IVCD_tot_sd,dX_avg,dX_sd,dG_avg,dG_sd,dL_avg,dL_sd,\
         Y_XG_avg,Y_XG_sd,Y_XL_avg,Y_XL_sd,q_G_avg,q_G_sd,q_L_avg,q_L_sd"
    );
    let row = find_row(&lines, "A,0,");
    assert_eq!(row[2], "110000");
    assert_eq!(row[3], (2e8f64).sqrt().to_string());
    assert_eq!(row[4], units::mmol_per_l(4.0, units::MM_GLUCOSE).to_string());
    assert_eq!(row[8], "");

    // B has a single replicate: averages but no spread.
    let row = find_row(&lines, "B,72,");
    assert_eq!(row[2], "500000");
    assert_eq!(row[3], "");

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn reruns_are_byte_identical() {
    let test_dir = setup_culture_dir("reruns_byte_identical");
    let test_dir_str = test_dir.to_str().expect("failed to convert test directory to string");

    run_bin(&["--culture-dir", test_dir_str, "interval"]);
    let file = test_dir.join("outputs").join("interval_kinetics.csv");
    let first = fs::read(&file).expect("failed to read first output");

    run_bin(&["--culture-dir", test_dir_str, "interval"]);
    let second = fs::read(&file).expect("failed to read second output");

    assert_eq!(first, second);

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn invalid_windows_fall_back_to_the_default() {
    let test_dir = setup_culture_dir("window_fallback");
    let test_dir_str = test_dir.to_str().expect("failed to convert test directory to string");

    run_bin(&["--culture-dir", test_dir_str, "phase", "--start", "0", "--end", "96"]);
    let file = test_dir.join("outputs").join("kinetics_by_clone_rep.csv");
    let reference = fs::read(&file).expect("failed to read reference output");

    // Reversed bounds are rejected in favor of the default window.
    run_bin(&["--culture-dir", test_dir_str, "phase", "--start", "96", "--end", "24"]);
    assert_eq!(fs::read(&file).expect("failed to read output"), reference);

    // Without flags the window is prompted for; closed stdin means no
    // usable answer, which also falls back to the default.
    run_bin(&["--culture-dir", test_dir_str, "phase"]);
    assert_eq!(fs::read(&file).expect("failed to read output"), reference);

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn unreadable_inputs_fail_the_run() {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("unreadable_inputs");

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir_all(&test_dir).expect("failed to create test directory");

    let test_dir_str = test_dir.to_str().expect("failed to convert test directory to string");

    // No data.csv at all.
    let output = bin_command(&["--culture-dir", test_dir_str, "interval"])
        .output()
        .expect("failed to execute command");
    assert!(!output.status.success());

    // A corrupt analysis.toml is fatal, not a fallback.
    fs::write(test_dir.join("data.csv"), DATA_CONTENTS).expect("failed to write data file");
    fs::write(test_dir.join("analysis.toml"), "batch_end_hr = -5.0\n")
        .expect("failed to write analysis config");
    let output = bin_command(&["--culture-dir", test_dir_str, "interval"])
        .output()
        .expect("failed to execute command");
    assert!(!output.status.success());

    // Pairing flags must come together.
    let output = bin_command(&["--culture-dir", test_dir_str, "phase", "--start", "0"])
        .output()
        .expect("failed to execute command");
    assert!(!output.status.success());

    fs::remove_dir_all(&test_dir).ok();
}
