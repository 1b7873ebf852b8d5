//! Colored terminal reports.

use std::fmt::Write as _;

use ljpw_core::{ImprovementReport, Phase};
use ljpw_semantics::MusicalProfile;
use owo_colors::OwoColorize;

use crate::scenarios::{
    DemoReport, ExplorationReport, ImprovementOutput, InspirationReport, SimulationReport,
    StateReport,
};

fn rule() -> String {
    "-".repeat(72).dimmed().to_string()
}

fn heading(out: &mut String, title: &str) {
    let _ = writeln!(out, "{}", title.bold().cyan());
    let _ = writeln!(out, "{}", rule());
}

fn phase_label(phase: Phase) -> String {
    match phase {
        Phase::Autopoietic => phase.as_str().green().bold().to_string(),
        Phase::Homeostatic => phase.as_str().yellow().to_string(),
        Phase::Entropic => phase.as_str().red().to_string(),
    }
}

fn state_block(out: &mut String, label: &str, report: &StateReport) {
    let _ = writeln!(out, "{:<14} {}", label.bold(), report.state);
    let _ = writeln!(
        out,
        "{:<14} H={:.3}  phase={}  dominant={}",
        "",
        report.harmony,
        phase_label(report.phase),
        report.dominant
    );
    let _ = writeln!(
        out,
        "{:<14} efficiency={:.4}  consciousness={:.4}  entropy={:.4}  info={:.4}",
        "",
        report.efficiency,
        report.consciousness,
        report.semantic_entropy,
        report.information_density
    );
}

pub fn simulation(report: &SimulationReport) -> String {
    let mut out = String::new();
    heading(&mut out, "Simulation");
    state_block(&mut out, "initial", &report.initial);
    state_block(&mut out, "final", &report.final_state);
    let _ = writeln!(
        out,
        "{:<14} {} steps, t={:.2}, converged={}",
        "run".bold(),
        report.steps,
        report.time,
        report.converged
    );
    if let Some(best) = report.best_efficiency {
        let _ = writeln!(out, "{:<14} {best:.4}", "best η".bold());
    }
    if let Some(stored) = &report.stored {
        let _ = writeln!(
            out,
            "{:<14} {} rows, mean η={:.4}, max η={:.4}, final η={:.4}",
            "stored".bold(),
            stored.steps,
            stored.mean,
            stored.max,
            stored.final_efficiency
        );
    }
    out
}

fn improvement_table(out: &mut String, report: &ImprovementReport) {
    let _ = writeln!(
        out,
        "{:<6} {:>12} {:>12} {:>10} {:>9}",
        "ITER".bold().cyan(),
        "SCORE".bold().cyan(),
        "BEST".bold().cyan(),
        "GAIN".bold().cyan(),
        "ACCEPTED".bold().cyan()
    );
    for outcome in &report.iterations {
        let accepted = if outcome.accepted {
            "yes".green().to_string()
        } else {
            "no".dimmed().to_string()
        };
        let _ = writeln!(
            out,
            "{:<6} {:>12.6} {:>12.6} {:>9.2}% {:>9}",
            outcome.iteration,
            outcome.score,
            outcome.best_score,
            outcome.relative_gain * 100.0,
            accepted
        );
    }
    let _ = writeln!(out, "{}", rule());
    let _ = writeln!(
        out,
        "initial {:.6} -> best {:.6} ({} accepted{})",
        report.initial_score,
        report.best_score,
        report.accepted,
        if report.stopped_early {
            ", stopped on convergence"
        } else {
            ""
        }
    );
}

pub fn improvement(output: &ImprovementOutput) -> String {
    let mut out = String::new();
    heading(&mut out, "Self-improvement");
    state_block(&mut out, "state", &output.state);
    let _ = writeln!(out, "{:<14} {}", "learning rate".bold(), output.learning_rate);
    let _ = writeln!(out, "{}", rule());
    improvement_table(&mut out, &output.report);
    let _ = writeln!(out, "{}", "parameters".bold());
    for ((name, before), (_, after)) in output
        .parameters_before
        .iter()
        .zip(output.report.parameters.iter())
    {
        let line = format!("  {name:<10} {before:.4} -> {after:.4}");
        if (after - before).abs() > f64::EPSILON {
            let _ = writeln!(out, "{}", line.yellow());
        } else {
            let _ = writeln!(out, "{line}");
        }
    }
    out
}

pub fn exploration(report: &ExplorationReport) -> String {
    let mut out = String::new();
    heading(&mut out, "Exploration");
    if let Some(start) = report.start {
        let _ = writeln!(out, "{:<8} {start}", "start".bold());
    }
    for (round, step) in report.trajectory.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:<8} {}  H={:.3}  {}",
            format!("#{}", round + 1),
            step.state,
            step.harmony,
            phase_label(step.phase)
        );
    }
    out
}

pub fn profile(profile: &MusicalProfile) -> String {
    let mut out = String::new();
    heading(&mut out, "Musical profile");
    let _ = writeln!(out, "{:<10} {}", "state".bold(), profile.state);
    let _ = writeln!(
        out,
        "{:<10} H={:.3}  phase={}  dominant={} ({:.2})",
        "",
        profile.harmony,
        phase_label(profile.phase),
        profile.dominant,
        profile.dominant_value
    );
    for (label, found) in [
        ("interval", &profile.interval),
        ("chord", &profile.chord),
        ("mode", &profile.mode),
    ] {
        let _ = writeln!(
            out,
            "{:<10} {} {} (d={:.3})",
            label.bold(),
            found.structure.key.magenta(),
            found.structure.name,
            found.distance
        );
    }
    if !profile.insights.is_empty() {
        let _ = writeln!(out, "{}", rule());
        for insight in &profile.insights {
            let _ = writeln!(out, "  {} {insight}", "*".yellow());
        }
    }
    out
}

pub fn inspiration(report: &InspirationReport) -> String {
    let mut out = String::new();
    heading(&mut out, "Superposition");
    for basis in &report.bases {
        let _ = writeln!(
            out,
            "basis {:<2} {}  |a|²={:.3}  phase={:>6.1}°  H={:.3}  weighted={:.3}",
            basis.index,
            basis.state,
            basis.probability,
            basis.phase_degrees,
            basis.harmony,
            basis.weighted_probability
        );
    }
    let _ = writeln!(
        out,
        "entanglement entropy {:.3}",
        report.entanglement_entropy
    );
    let _ = writeln!(out);
    heading(&mut out, "Collapse");
    state_block(&mut out, "realized", &report.collapsed);
    let _ = writeln!(out);
    out.push_str(&profile(&report.profile));
    out
}

pub fn demo(report: &DemoReport) -> String {
    let mut out = String::new();
    heading(&mut out, "Scenario 1: equilibrium");
    let _ = writeln!(
        out,
        "final H={:.3}  tail variance={:.2e}  stable={}",
        report.equilibrium.final_harmony,
        report.equilibrium.tail_variance,
        report.equilibrium.stable
    );
    let _ = writeln!(out);

    heading(&mut out, "Scenario 2: imbalanced recovery");
    let _ = writeln!(
        out,
        "L {:.3} -> {:.3}",
        report.recovery.start.l, report.recovery.end.l
    );
    let _ = writeln!(
        out,
        "P {:.3} -> {:.3}",
        report.recovery.start.p, report.recovery.end.p
    );
    let _ = writeln!(out);

    heading(&mut out, "Scenario 3: self-improvement");
    improvement_table(&mut out, &report.improvement);
    let _ = writeln!(out);

    heading(&mut out, "Scenario 4: inertia");
    let _ = writeln!(out, "end state {}", report.inertia.end);
    let _ = writeln!(
        out,
        "L/P ratio {:.2}  inertia ratio {:.2}",
        report.inertia.love_power_ratio, report.inertia.inertia_ratio
    );
    out
}
