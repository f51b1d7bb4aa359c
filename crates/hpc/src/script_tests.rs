// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn full_resources() -> Resources {
    Resources {
        allocation: Some("wind".to_string()),
        walltime: Some(1.5),
        qos: Some("high".to_string()),
        memory: Some("83".to_string()),
        queue: Some("standard".to_string()),
        feature: Some("--exclusive".to_string()),
        conda_env: Some("prod".to_string()),
        module: Some("cuda/12.2".to_string()),
        sh_script: Some("export TMPDIR=/scratch".to_string()),
    }
}

#[test]
fn slurm_script_carries_directives() {
    let resources = full_resources();
    let spec = SubmitSpec {
        job_name: "generation_j0",
        command: "swath generation -c ./generation_j0.task.json -v",
        project_dir: Path::new("/projects/run1"),
        stdout_dir: Path::new("/projects/run1/logs/stdout"),
        resources: &resources,
    };
    let text = render(&Backend::Slurm, &spec);

    assert!(text.starts_with("#!/bin/bash\n"));
    assert!(text.contains("#SBATCH --job-name=generation_j0"));
    assert!(text.contains("#SBATCH --account=wind"));
    assert!(text.contains("#SBATCH --time=01:30:00"));
    assert!(text.contains("#SBATCH --qos=high"));
    assert!(text.contains("#SBATCH --mem=83G"));
    assert!(text.contains("#SBATCH --partition=standard"));
    assert!(text.contains("#SBATCH --exclusive"));
    assert!(text.contains("#SBATCH --output=/projects/run1/logs/stdout/generation_j0_%j.o"));
    assert!(text.contains("set -eo pipefail"));
    assert!(text.contains("module load cuda/12.2"));
    assert!(text.contains("source activate prod"));
    assert!(text.contains("export TMPDIR=/scratch"));
    assert!(text.contains("cd /projects/run1"));
    assert!(text.ends_with("swath generation -c ./generation_j0.task.json -v\n"));
}

#[test]
fn environment_lines_precede_the_command() {
    let resources = full_resources();
    let spec = SubmitSpec {
        job_name: "run",
        command: "swath run -c ./run.task.json",
        project_dir: Path::new("."),
        stdout_dir: Path::new("./logs/stdout"),
        resources: &resources,
    };
    let text = render(&Backend::Slurm, &spec);
    let conda = text.find("source activate").unwrap();
    let preamble = text.find("export TMPDIR").unwrap();
    let command = text.find("swath run -c").unwrap();
    assert!(conda < preamble && preamble < command);
}

#[test]
fn local_script_has_no_sbatch_directives() {
    let resources = Resources {
        conda_env: Some("prod".to_string()),
        ..Resources::default()
    };
    let spec = SubmitSpec {
        job_name: "run",
        command: "swath run -c ./run.task.json",
        project_dir: Path::new("."),
        stdout_dir: Path::new("./logs/stdout"),
        resources: &resources,
    };
    let text = render(&Backend::Local, &spec);
    assert!(!text.contains("#SBATCH"));
    assert!(text.contains("source activate prod"));
}

#[test]
fn submit_script_writes_under_script_dir() {
    let dir = tempfile::tempdir().unwrap();
    let resources = Resources::default();
    let stdout_dir = dir.path().join("logs/stdout");
    let spec = SubmitSpec {
        job_name: "run_a1",
        command: "true",
        project_dir: dir.path(),
        stdout_dir: &stdout_dir,
        resources: &resources,
    };

    let path = submit_script(&Backend::Local, &spec).unwrap();
    assert_eq!(path, dir.path().join(SCRIPT_DIR).join("run_a1.sh"));
    assert!(path.is_file());
    assert!(stdout_dir.is_dir());
}
