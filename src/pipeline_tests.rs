#[cfg(test)]
mod tests {
    use crate::Analysis::plots::{PlotBackend, series_names};
    use crate::KEGG::kegg_api::{HttpClient, HttpReply, KeggError};
    use crate::pipeline::{Pipeline, PipelineError};
    use crate::settings::RunSettings;
    use approx::assert_abs_diff_eq;
    use std::cell::RefCell;
    use std::collections::HashMap;

    const LINK_URL: &str = "https://rest.kegg.jp/link/reaction/cpd:C00031";
    const GET_URL: &str = "https://rest.kegg.jp/get/rn:R00010+rn:R00299+rn:R01600";

    #[derive(Default)]
    struct MockKegg {
        responses: HashMap<String, String>,
        requests: RefCell<Vec<String>>,
    }

    impl MockKegg {
        fn with(mut self, url: &str, body: &str) -> Self {
            self.responses.insert(url.to_string(), body.to_string());
            self
        }
    }

    impl HttpClient for MockKegg {
        fn get_text(&self, url: &str) -> Result<HttpReply, KeggError> {
            self.requests.borrow_mut().push(url.to_string());
            Ok(match self.responses.get(url) {
                Some(body) => HttpReply {
                    status: 200,
                    body: body.clone(),
                },
                None => HttpReply {
                    status: 404,
                    body: String::new(),
                },
            })
        }
    }

    fn link_body() -> String {
        ["rn:R00010", "rn:R00299", "rn:R01600"]
            .iter()
            .map(|r| format!("cpd:C00031\t{}\n", r))
            .collect()
    }

    fn glucose_records() -> String {
        "ENTRY       R00010                      Reaction
NAME        alpha,alpha-trehalose glucohydrolase
DEFINITION  alpha,alpha-Trehalose + H2O <=> 2 D-Glucose
EQUATION    C01083 + C00001 <=> 2 C00031
///
ENTRY       R00299                      Reaction
NAME        ATP:D-glucose 6-phosphotransferase
DEFINITION  ATP + D-Glucose <=> ADP + D-Glucose 6-phosphate
EQUATION    C00002 + C00031 <=> C00008 + C00092
///
ENTRY       R01600                      Reaction
NAME        ATP:beta-D-glucose 6-phosphotransferase
EQUATION    C00002 + C00221 <=> C00008 + C01172
///
"
        .to_string()
    }

    fn settings() -> RunSettings {
        RunSettings {
            plot: PlotBackend::Disabled,
            n_points: 50,
            ..RunSettings::default()
        }
    }

    fn glucose_client() -> MockKegg {
        MockKegg::default()
            .with(LINK_URL, &link_body())
            .with(GET_URL, &glucose_records())
    }

    #[test]
    fn test_glucose_run() {
        let pipeline = Pipeline::with_client(glucose_client(), settings()).unwrap();
        let run = pipeline.run("cpd:C00031").unwrap();
        assert_eq!(run.molecule, "C00031");
        assert_eq!(run.reactions.len(), 3);
        assert!(run.failures.is_empty());
        assert!(run.network.contains_molecule("C00031"));
        assert!(run.network.has_edge("C00002", "C00092"));
        assert_eq!(run.scenarios.len(), 1);

        let scenario = &run.scenarios[0];
        assert_eq!(scenario.query_initial, None);
        assert_eq!(scenario.trajectory.n_points(), 50);
        assert_eq!(scenario.trajectory.n_species(), run.network.node_count());
        assert!(scenario.trajectory.all_finite());
        assert_eq!(scenario.changes.len(), run.network.node_count());
        assert_eq!(pipeline.api().client().requests.borrow().len(), 2);
        assert!(pipeline.report(&run).is_ok());
    }

    #[test]
    fn test_no_linked_reactions() {
        let pipeline = Pipeline::with_client(MockKegg::default(), settings()).unwrap();
        let result = pipeline.run("C99999");
        assert!(matches!(result, Err(PipelineError::NoReactions(ref m)) if m == "C99999"));
        // stops after the link request
        assert_eq!(pipeline.api().client().requests.borrow().len(), 1);
    }

    #[test]
    fn test_only_malformed_records() {
        let broken = "ENTRY       R00010                      Reaction
NAME        no equation here
///
ENTRY       R00299                      Reaction
EQUATION    C00002 + C00031 C00008
///
ENTRY       R01600                      Reaction
///
";
        let client = MockKegg::default()
            .with(LINK_URL, &link_body())
            .with(GET_URL, broken);
        let pipeline = Pipeline::with_client(client, settings()).unwrap();
        assert!(matches!(
            pipeline.run("C00031"),
            Err(PipelineError::NoReactions(_))
        ));
    }

    #[test]
    fn test_initial_concentration_sweep() {
        let sweep = vec![0.1, 0.5, 1.0, 2.0];
        let settings = RunSettings {
            initial_concentration_sweep: sweep.clone(),
            default_initial_concentration: 0.1,
            ..settings()
        };
        let pipeline = Pipeline::with_client(glucose_client(), settings).unwrap();
        let run = pipeline.run("C00031").unwrap();
        assert_eq!(run.scenarios.len(), 4);
        for (scenario, c) in run.scenarios.iter().zip(sweep) {
            assert_eq!(scenario.query_initial, Some(c));
            assert!(scenario.file_prefix.is_some());
            assert_abs_diff_eq!(
                scenario.trajectory.initial_value("C00031").unwrap(),
                c,
                epsilon = 1e-12
            );
            assert_abs_diff_eq!(
                scenario.trajectory.initial_value("C00002").unwrap(),
                0.1,
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_sweep_plot_files_do_not_collide() {
        let settings = RunSettings {
            initial_concentration_sweep: vec![0.1, 0.5, 1.0, 2.0],
            ..settings()
        };
        let pipeline = Pipeline::with_client(glucose_client(), settings).unwrap();
        let run = pipeline.run("C00031").unwrap();
        let mut all_names: Vec<String> = run
            .scenarios
            .iter()
            .flat_map(|s| series_names(&s.trajectory, s.file_prefix.as_deref()))
            .collect();
        let total = all_names.len();
        assert_eq!(total, 4 * run.network.node_count());
        all_names.sort();
        all_names.dedup();
        assert_eq!(all_names.len(), total);
    }

    #[test]
    fn test_sweep_without_queried_molecule_runs_base_scenario() {
        // the only linked reaction does not contain C00031 in its equation
        let record = "ENTRY       R01600                      Reaction
EQUATION    C00002 + C00221 <=> C00008 + C01172
///
";
        let client = MockKegg::default()
            .with(LINK_URL, "cpd:C00031\trn:R01600\n")
            .with("https://rest.kegg.jp/get/rn:R01600", record);
        let settings = RunSettings {
            initial_concentration_sweep: vec![0.1, 2.0],
            ..settings()
        };
        let pipeline = Pipeline::with_client(client, settings).unwrap();
        let run = pipeline.run("C00031").unwrap();
        assert!(!run.network.contains_molecule("C00031"));
        assert_eq!(run.scenarios.len(), 1);
        assert_eq!(run.scenarios[0].query_initial, None);
        assert_eq!(run.scenarios[0].label, "base");
    }

    #[test]
    fn test_prepare_stops_before_simulation() {
        let pipeline = Pipeline::with_client(glucose_client(), settings()).unwrap();
        let prepared = pipeline.prepare("C00031").unwrap();
        assert_eq!(prepared.reactions.len(), 3);
        assert!(prepared.failures.is_empty());
        assert!(prepared.network.contains_molecule("C00031"));
        assert_eq!(
            pipeline.scenarios(&prepared.network, &prepared.molecule),
            vec![None]
        );
        let scenarios = pipeline.simulate_scenarios(&prepared).unwrap();
        assert_eq!(scenarios.len(), 1);
    }

    #[test]
    fn test_report_writes_one_csv_per_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("glucose_run");
        let settings = RunSettings {
            initial_concentration_sweep: vec![0.5, 2.0],
            csv_output: Some(output.to_str().unwrap().to_string()),
            ..settings()
        };
        let pipeline = Pipeline::with_client(glucose_client(), settings).unwrap();
        let run = pipeline.run("C00031").unwrap();
        pipeline.report(&run).unwrap();
        assert!(dir.path().join("glucose_run_0.csv").exists());
        assert!(dir.path().join("glucose_run_1.csv").exists());
    }

    #[test]
    fn test_report_fails_on_unwritable_csv() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("missing").join("run");
        let settings = RunSettings {
            csv_output: Some(output.to_str().unwrap().to_string()),
            ..settings()
        };
        let pipeline = Pipeline::with_client(glucose_client(), settings).unwrap();
        let run = pipeline.run("C00031").unwrap();
        assert!(matches!(
            pipeline.report(&run),
            Err(PipelineError::Analysis(_))
        ));
    }

    #[test]
    fn test_invalid_inputs() {
        let pipeline = Pipeline::with_client(glucose_client(), settings()).unwrap();
        assert!(matches!(
            pipeline.run("glucose"),
            Err(PipelineError::Fetch(KeggError::InvalidIdentifier(_)))
        ));
        assert!(pipeline.api().client().requests.borrow().is_empty());

        let bad = RunSettings {
            n_points: 1,
            ..settings()
        };
        assert!(matches!(
            Pipeline::with_client(MockKegg::default(), bad),
            Err(PipelineError::Settings(_))
        ));
    }
}
