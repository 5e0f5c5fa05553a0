use anyhow::{bail, Context, Result};
use std::env;
use std::process::Command;

/// Options derived from the host machine used to configure cargo commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    pub features: Vec<String>,
    pub rustflags: Option<String>,
}

impl BuildConfig {
    /// Join features into a single string suitable for passing to cargo.
    pub fn features_arg(&self) -> Option<String> {
        if self.features.is_empty() {
            None
        } else {
            Some(self.features.join(" "))
        }
    }

    fn apply(&self, cmd: &mut Command) {
        if let Some(rf) = &self.rustflags {
            cmd.env("RUSTFLAGS", rf);
        }
        if let Some(f) = self.features_arg() {
            cmd.arg("--features").arg(f);
        }
    }
}

/// Detect build configuration from the current machine.
pub fn detect_config() -> BuildConfig {
    let arch = detect_arch();
    let cpu_flags = detect_cpu_flags();
    let extra = env::var("QSTFT_FEATURES").unwrap_or_default();
    compute_config(&arch, &cpu_flags, &extra)
}

fn detect_arch() -> String {
    if let Ok(arch) = env::var("ARCH") {
        if !arch.trim().is_empty() {
            return arch;
        }
    }
    Command::new("uname")
        .arg("-m")
        .output()
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .unwrap_or_else(|_| env::consts::ARCH.to_string())
}

fn detect_cpu_flags() -> String {
    if let Ok(out) = Command::new("lscpu").output() {
        let s = String::from_utf8_lossy(&out.stdout);
        for line in s.lines() {
            if line.to_lowercase().contains("flags") {
                return line.to_string();
            }
        }
    }
    if let Ok(out) = Command::new("sysctl")
        .args(["-n", "machdep.cpu.features"])
        .output()
    {
        return String::from_utf8_lossy(&out.stdout).to_string();
    }
    String::new()
}

/// Compute a [`BuildConfig`] from supplied inputs. This is separated for testing.
///
/// The SIMD kernels are picked at runtime either way; on an AVX2 host the
/// rest of the crate is also compiled with AVX2 enabled.
pub fn compute_config(arch: &str, cpu_flags: &str, extra: &str) -> BuildConfig {
    let mut features = Vec::new();
    let mut rustflags = None;

    if arch.contains("x86_64") {
        features.push("x86_64".into());
        if cpu_flags.contains("avx2") {
            rustflags = Some("-C target-feature=+avx2".into());
        }
    } else if arch.contains("aarch64") || arch.contains("arm64") {
        features.push("aarch64".into());
    }

    for feat in extra.split_whitespace() {
        if !features.iter().any(|f| f == feat) {
            features.push(feat.to_string());
        }
    }

    BuildConfig {
        features,
        rustflags,
    }
}

fn cargo(args: &[&str]) -> Command {
    let mut cmd = Command::new("cargo");
    cmd.args(args);
    cmd
}

pub fn build_command(cfg: &BuildConfig) -> Command {
    let mut cmd = cargo(&["build", "-p", "qstft"]);
    cfg.apply(&mut cmd);
    cmd
}

pub fn test_command(cfg: &BuildConfig) -> Command {
    let mut cmd = cargo(&["test", "-p", "qstft"]);
    cfg.apply(&mut cmd);
    cmd
}

/// Library build without `std`, the configuration firmware links against.
pub fn no_std_command() -> Command {
    cargo(&["build", "-p", "qstft", "--lib", "--no-default-features"])
}

pub fn clippy_command() -> Command {
    cargo(&["clippy", "--all-targets", "--all-features", "--", "-D", "warnings"])
}

pub fn fmt_command() -> Command {
    cargo(&["fmt", "--all"])
}

pub fn bench_command(cfg: &BuildConfig) -> Command {
    let mut cmd = cargo(&["bench", "-p", "qstft", "--bench", "bench_stft"]);
    cfg.apply(&mut cmd);
    cmd
}

pub fn demo_command(cfg: &BuildConfig, verbose: bool) -> Command {
    let mut cfg = cfg.clone();
    let example = if verbose {
        if !cfg.features.iter().any(|f| f == "verbose-logging") {
            cfg.features.push("verbose-logging".into());
        }
        "verbose_logging"
    } else {
        "stft_pipeline"
    };
    let mut cmd = cargo(&["run", "-p", "qstft", "--release", "--example", example]);
    cfg.apply(&mut cmd);
    cmd
}

/// Run `cmd` to completion, failing on a non-zero exit.
pub fn run(mut cmd: Command) -> Result<()> {
    let shown = format!("{:?}", cmd);
    let status = cmd
        .status()
        .with_context(|| format!("failed to spawn {shown}"))?;
    if !status.success() {
        bail!("{shown} exited with {status}");
    }
    Ok(())
}
