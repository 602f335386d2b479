//! Trial-table expansion over parsed documents: ordering, determinism, and
//! the resolution errors the hierarchy can surface.

use exptfile::{expand_trials, parse_experiment_source, ResolveError};

fn trial_def(label: &str, cs_onset: u32) -> String {
    format!(
        "def trial {label}
            int use_cs 1
            int use_pfpc_plast 1
            int use_mfnc_plast 0
            int cs_onset {cs_onset}
            int cs_len 500
            float cs_percent 100.0
            int use_us 1
            int us_onset 900
        end"
    )
}

fn experiment_with(trial_defs: &str, hierarchy_defs: &str) -> String {
    format!(
        "begin filetype run
    begin section trial_def
        {trial_defs}
        {hierarchy_defs}
    end
end
"
    )
}

#[test]
fn expansion_order_follows_declaration_order() {
    let source = experiment_with(
        &format!("{}\n{}", trial_def("warmup", 200), trial_def("probe", 600)),
        "def block pairing
            warmup 2
            probe
        end
        def experiment
            pairing 3
        end",
    );
    let (document, diagnostics) = parse_experiment_source(&source).unwrap();
    assert!(diagnostics.is_empty());

    let table = expand_trials(&document).unwrap();
    assert_eq!(table.num_trials, 9);
    assert_eq!(
        table.trial_names,
        vec![
            "warmup", "warmup", "probe", "warmup", "warmup", "probe", "warmup", "warmup", "probe",
        ]
    );
    assert_eq!(
        table.cs_onsets,
        vec![200, 200, 600, 200, 200, 600, 200, 200, 600]
    );
}

#[test]
fn repeated_resolution_is_identical() {
    let source = experiment_with(
        &trial_def("t1", 400),
        "def block b1
            t1 4
        end
        def session s1
            b1 3
        end
        def experiment
            s1 2
            t1
        end",
    );
    let (document, _) = parse_experiment_source(&source).unwrap();
    let first = expand_trials(&document).unwrap();
    let second = expand_trials(&document).unwrap();
    assert_eq!(first, second);
    // 2 * (3 * 4) + 1
    assert_eq!(first.num_trials, 25);
}

#[test]
fn unknown_reference_is_a_resolution_error() {
    let source = experiment_with(
        &trial_def("t1", 400),
        "def block b1
            t1 2
            missing_trial 4
        end
        def experiment
            b1 1
        end",
    );
    let (document, diagnostics) = parse_experiment_source(&source).unwrap();
    assert!(diagnostics.is_empty());

    assert_eq!(
        expand_trials(&document),
        Err(ResolveError::UnknownLabel {
            label: "missing_trial".to_string(),
            referenced_from: "b1".to_string(),
        })
    );
}

#[test]
fn self_referencing_session_is_a_resolution_error() {
    let source = experiment_with(
        &trial_def("t1", 400),
        "def session loop_session
            loop_session 2
        end
        def experiment
            loop_session 1
        end",
    );
    let (document, _) = parse_experiment_source(&source).unwrap();

    assert_eq!(
        expand_trials(&document),
        Err(ResolveError::CyclicReference {
            label: "loop_session".to_string(),
        })
    );
}

#[test]
fn incomplete_trial_is_a_resolution_error() {
    let source = experiment_with(
        "def trial bare
            int use_cs 1
        end",
        "def experiment
            bare 2
        end",
    );
    let (document, _) = parse_experiment_source(&source).unwrap();

    assert!(matches!(
        expand_trials(&document),
        Err(ResolveError::MissingField { ref trial, .. }) if trial == "bare"
    ));
}
