//! apkpolicy CLI
//!
//! Shows and verifies the signing, optimization, and packaging decisions for
//! an Android build.

use anyhow::Result;
use apkpolicy_android::archive::ArchiveManifest;
use apkpolicy_android::env::ProcessEnv;
use apkpolicy_android::exclusions::Coordinate;
use apkpolicy_android::optimization::{BuildType, RuleFile};
use apkpolicy_android::policy::{BuildPlan, PolicyInputs, SigningAndPackagingPolicy};
use apkpolicy_android::signing::{SigningIdentity, SigningSummary};
use apkpolicy_cli::output::{format_count, format_flag, format_list, format_size, Status};
use apkpolicy_core::config::Config;
use apkpolicy_core::error::{exit_codes, Error};
use apkpolicy_telemetry::TelemetryConfig;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "apkpolicy")]
#[command(about = "Release-signing and reproducible-packaging policy for Android builds")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Project directory searched for apkpolicy.toml; configured paths are relative to it
    #[arg(long, global = true, default_value = ".")]
    project_dir: PathBuf,

    /// Increase output verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the full build plan for a build type
    Plan {
        /// Build type: release, debug
        #[arg(long, default_value = "release")]
        build_type: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the selected signing identity
    Signing {
        /// Check that the keystore can be read
        #[arg(long)]
        verify: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List excluded dependencies or check coordinates against them
    Exclusions {
        /// Coordinates to check (group:module[:version])
        #[arg(long, num_args = 1..)]
        check: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compute the reproducible archive manifest of a directory
    Manifest {
        /// Directory holding packaging inputs
        dir: PathBuf,
        /// Second directory to compare against
        #[arg(long)]
        compare: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose the signing environment
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        owo_colors::set_override(false);
    }

    apkpolicy_telemetry::init_with_config(
        &TelemetryConfig::from_verbosity(cli.verbose, cli.quiet).json(cli.json_logs),
    )?;

    let config = match Config::load(cli.config.as_deref(), &cli.project_dir) {
        Ok(config) => config,
        Err(e) => {
            Status::error(&e.to_string());
            std::process::exit(e.exit_code());
        }
    };
    tracing::debug!(
        session_id = apkpolicy_telemetry::session_id(),
        config = ?config.path,
        "Configuration loaded"
    );

    // The only place release credentials are read from the environment.
    let inputs = PolicyInputs::capture(config.schema, &cli.project_dir, &ProcessEnv);
    let policy = SigningAndPackagingPolicy::new(inputs);

    let exit_code = match cli.command {
        Commands::Plan { build_type, json } => run_plan(&policy, &build_type, json),
        Commands::Signing { verify, json } => run_signing(&policy, verify, json),
        Commands::Exclusions { check, json } => run_exclusions(&check, json),
        Commands::Manifest { dir, compare, json } => run_manifest(&dir, compare.as_deref(), json),
        Commands::Doctor { json } => run_doctor(&policy, json),
    };

    std::process::exit(exit_code);
}

fn print_json(value: &impl Serialize) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            exit_codes::SUCCESS
        }
        Err(e) => {
            Status::error(&format!("Failed to serialize output: {e}"));
            exit_codes::FAILURE
        }
    }
}

fn report_error(error: &Error, json: bool) -> i32 {
    if json {
        print_json(&error.to_report());
    } else {
        Status::error(&error.to_string());
    }
    error.exit_code()
}

fn run_plan(policy: &SigningAndPackagingPolicy, build_type: &str, json: bool) -> i32 {
    let build_type: BuildType = match build_type.parse() {
        Ok(bt) => bt,
        Err(e) => return report_error(&e, json),
    };

    let plan = policy.plan(build_type);
    if json {
        return print_json(&plan);
    }

    print_plan(&plan);
    exit_codes::SUCCESS
}

fn print_plan(plan: &BuildPlan) {
    Status::header(&format!("Build plan: {}", plan.build_type));
    Status::field("application id", &plan.application_id);
    Status::field("namespace", &plan.namespace);
    Status::field(
        "version",
        &format!("{} ({})", plan.sdk.version_name, plan.sdk.version_code),
    );
    Status::field(
        "sdk",
        &format!(
            "min {} / target {} / compile {}",
            plan.sdk.min_sdk, plan.sdk.target_sdk, plan.sdk.compile_sdk
        ),
    );
    Status::field("ndk", &plan.sdk.ndk_version);
    Status::field("java", &plan.sdk.java_version.to_string());

    print_signing(&plan.signing);

    Status::subheader("Optimization");
    Status::flag("minify", plan.optimization.minify);
    Status::flag("shrink resources", plan.optimization.shrink_resources);
    let rules: Vec<String> = plan
        .optimization
        .obfuscation_rule_files
        .iter()
        .map(ToString::to_string)
        .collect();
    Status::field("rule files", &format_list(&rules));

    Status::subheader("Packaging");
    Status::flag("preserve timestamps", plan.archive.preserve_timestamps);
    Status::flag("reproducible order", plan.archive.reproducible_file_order);
    Status::flag("dependency info", plan.include_dependency_info);
    Status::field(
        "exclusions",
        &format_count(plan.exclusions.len(), "rule", "rules"),
    );

    Status::subheader("Projects");
    Status::field("root build dir", &plan.root_build_dir.display().to_string());
    for project in &plan.projects {
        Status::field(&project.path, &project.build_dir.display().to_string());
    }
}

fn print_signing(summary: &SigningSummary) {
    Status::subheader("Signing");
    Status::field("config", &summary.config_name);
    Status::field("keystore", &summary.keystore.display().to_string());
    Status::field("key alias", &summary.key_alias);
    match &summary.schemes {
        Some(schemes) => {
            for (version, enabled) in [(1, schemes.v1), (2, schemes.v2), (3, schemes.v3), (4, schemes.v4)] {
                Status::field(&format!("v{version} signing"), &format_flag(enabled));
            }
        }
        None => Status::field("schemes", "host defaults"),
    }
}

fn run_signing(policy: &SigningAndPackagingPolicy, verify: bool, json: bool) -> i32 {
    let identity = policy.signing_identity_for(BuildType::Release);
    let config_name = policy
        .build_types()
        .config_for(BuildType::Release)
        .map_or("debug", |c| c.signing_config.as_str());
    let summary = identity.summary(config_name);

    let verified = if verify { Some(identity.verify()) } else { None };

    if json {
        let report = serde_json::json!({
            "signing": summary,
            "verified": verified.as_ref().map(|r| r.is_ok()),
            "error": verified.as_ref().and_then(|r| r.as_ref().err()).map(Error::to_report),
        });
        print_json(&report);
    } else {
        print_signing(&summary);
        if let SigningIdentity::Debug(_) = identity {
            Status::info("Release credentials not configured; release builds use the debug identity");
        }
    }

    match verified {
        Some(Ok(())) => {
            if !json {
                Status::success("Keystore is readable");
            }
            exit_codes::SUCCESS
        }
        Some(Err(e)) => {
            if !json {
                Status::error(&e.to_string());
            }
            e.exit_code()
        }
        None => exit_codes::SUCCESS,
    }
}

#[derive(Serialize)]
struct ExclusionCheck {
    coordinate: String,
    excluded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    rule: Option<String>,
}

fn run_exclusions(check: &[String], json: bool) -> i32 {
    let exclusions = SigningAndPackagingPolicy::dependency_exclusions();

    if check.is_empty() {
        if json {
            return print_json(&exclusions);
        }
        Status::header("Excluded dependencies");
        for rule in exclusions.rules() {
            println!("  {rule}");
        }
        return exit_codes::SUCCESS;
    }

    let mut results = Vec::with_capacity(check.len());
    for raw in check {
        let coordinate = match Coordinate::parse(raw) {
            Ok(c) => c,
            Err(e) => return report_error(&e, json),
        };
        let rule = exclusions.matching_rule(&coordinate).map(ToString::to_string);
        results.push(ExclusionCheck {
            coordinate: coordinate.to_string(),
            excluded: rule.is_some(),
            rule,
        });
    }

    if json {
        return print_json(&results);
    }

    for result in &results {
        match &result.rule {
            Some(rule) => Status::warning(&format!("{} is excluded by {rule}", result.coordinate)),
            None => Status::success(&format!("{} is allowed", result.coordinate)),
        }
    }
    exit_codes::SUCCESS
}

fn run_manifest(dir: &Path, compare: Option<&Path>, json: bool) -> i32 {
    let policy = SigningAndPackagingPolicy::archive_determinism_policy();

    let manifest = match ArchiveManifest::collect(dir, policy) {
        Ok(m) => m,
        Err(e) => return report_error(&e, json),
    };

    let Some(other_dir) = compare else {
        if json {
            return print_json(&manifest);
        }
        Status::header(&format!("Archive manifest: {}", dir.display()));
        for entry in &manifest.entries {
            println!("  {}  {}", &entry.sha256[..12], entry.path);
        }
        println!();
        Status::field(
            "entries",
            &format_count(manifest.entries.len(), "entry", "entries"),
        );
        Status::field("size", &format_size(manifest.total_size()));
        Status::field("digest", &manifest.digest);
        return exit_codes::SUCCESS;
    };

    let other = match ArchiveManifest::collect(other_dir, policy) {
        Ok(m) => m,
        Err(e) => return report_error(&e, json),
    };
    let differences = manifest.differences(&other);
    let identical = manifest.digest == other.digest;

    if json {
        print_json(&serde_json::json!({
            "left": manifest.digest,
            "right": other.digest,
            "identical": identical,
            "differences": differences,
        }));
    } else if identical {
        Status::success(&format!("Reproducible: {}", manifest.digest));
    } else {
        Status::error(&format!(
            "Outputs differ in {}",
            format_count(differences.len(), "path", "paths")
        ));
        for path in &differences {
            println!("  {path}");
        }
    }

    if identical {
        exit_codes::SUCCESS
    } else {
        exit_codes::VALIDATION_ERROR
    }
}

#[derive(Serialize)]
struct DoctorCheck {
    name: &'static str,
    ok: bool,
    required: bool,
    message: String,
}

fn run_doctor(policy: &SigningAndPackagingPolicy, json: bool) -> i32 {
    let mut checks = Vec::new();

    let debug = policy.signing_identity_for(BuildType::Debug);
    checks.push(match debug.verify() {
        Ok(()) => DoctorCheck {
            name: "debug keystore",
            ok: true,
            required: true,
            message: debug.keystore_path().display().to_string(),
        },
        Err(e) => DoctorCheck {
            name: "debug keystore",
            ok: false,
            required: true,
            message: e.message,
        },
    });

    let release = policy.signing_identity();
    checks.push(if release.is_release() {
        match release.verify() {
            Ok(()) => DoctorCheck {
                name: "release keystore",
                ok: true,
                required: true,
                message: release.keystore_path().display().to_string(),
            },
            Err(e) => DoctorCheck {
                name: "release keystore",
                ok: false,
                required: true,
                message: e.message,
            },
        }
    } else {
        DoctorCheck {
            name: "release keystore",
            ok: false,
            required: false,
            message: "credentials incomplete, release builds fall back to debug signing".to_string(),
        }
    });

    let app_dir = policy.layout().app_dir();
    checks.push(DoctorCheck {
        name: "app module",
        ok: app_dir.is_dir(),
        required: false,
        message: app_dir.display().to_string(),
    });

    let custom_rules = policy
        .optimization_policy_for(BuildType::Release)
        .obfuscation_rule_files
        .iter()
        .filter_map(|rule| match rule {
            RuleFile::Project(name) => Some(app_dir.join(name)),
            RuleFile::Bundled(_) => None,
        })
        .collect::<Vec<_>>();
    for rules in custom_rules {
        checks.push(DoctorCheck {
            name: "project rules",
            ok: rules.is_file(),
            required: false,
            message: rules.display().to_string(),
        });
    }

    let healthy = checks.iter().all(|c| c.ok || !c.required);

    if json {
        print_json(&serde_json::json!({
            "healthy": healthy,
            "checks": checks,
        }));
    } else {
        Status::header("Environment Check");
        for check in &checks {
            let line = format!("{}: {}", check.name, check.message);
            if check.ok {
                Status::success(&line);
            } else if check.required {
                Status::error(&line);
            } else {
                Status::warning(&line);
            }
        }
    }

    if healthy {
        exit_codes::SUCCESS
    } else {
        exit_codes::SIGNING_ERROR
    }
}
