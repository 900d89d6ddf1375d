//! Reference cases with known traffic results, and the harness that checks them

use crate::config::Config;
use crate::error::TrafficError;
use crate::graph::builder::parse_descriptions;
use crate::storage::serialize_traffic_result;
use crate::traffic::TrafficAnalyzer;

/// A set of city descriptions and the serialized result they must produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceCase {
    pub input: Vec<&'static str>,
    pub expected: &'static str,
}

/// Outcome of running one reference case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseOutcome {
    /// 1-based position of the case
    pub index: usize,
    pub expected: String,
    pub actual: String,
}

impl CaseOutcome {
    pub fn is_correct(&self) -> bool {
        self.actual == self.expected
    }

    /// One-line verdict in the `test case #k ---> CORRECT` form
    pub fn verdict(&self) -> String {
        if self.is_correct() {
            format!("test case #{} ---> CORRECT", self.index)
        } else {
            format!(
                "test case #{} ---> WRONG (got {} but expected {})",
                self.index, self.actual, self.expected
            )
        }
    }
}

/// The built-in reference cases
pub fn reference_cases() -> Vec<ReferenceCase> {
    vec![
        ReferenceCase {
            input: vec![
                "1:[2,7,8]", "2:[1,3,6]", "3:[2,4,5]", "4:[3]", "5:[3]", "6:[2]",
                "7:[1]", "8:[1,9,12]", "9:[8,10,11]", "10:[9]", "11:[9]", "12:[8]", "13:[]",
            ],
            expected: "1:50,2:58,3:66,4:74,5:73,6:72,7:71,8:30,9:48,10:68,11:67,12:66,13:0",
        },
        ReferenceCase {
            input: vec![
                "1:[5]", "4:[5]", "3:[5]", "5:[1,4,3,2]",
                "2:[5,15,7]", "7:[2,8]", "8:[7,38]", "15:[2]", "38:[8]",
            ],
            expected: "1:82,2:53,3:80,4:79,5:70,7:46,8:38,15:68,38:45",
        },
        ReferenceCase {
            input: vec!["1:[5]", "2:[5]", "3:[5]", "4:[5]", "5:[1,2,3,4]"],
            expected: "1:14,2:13,3:12,4:11,5:4",
        },
        ReferenceCase {
            input: vec!["1:[5]", "2:[5,18]", "3:[5,12]", "4:[5]", "5:[1,2,3,4]", "18:[2]", "12:[3]"],
            expected: "1:44,2:25,3:30,4:41,5:20,12:33,18:27",
        },
    ]
}

/// Run every case through one analyzer, resetting it between cases
pub fn run_cases(cases: &[ReferenceCase], config: &Config) -> Result<Vec<CaseOutcome>, TrafficError> {
    let mut analyzer = TrafficAnalyzer::new(config.clone());
    let mut outcomes = Vec::with_capacity(cases.len());

    for (index, case) in cases.iter().enumerate() {
        analyzer.load(parse_descriptions(&case.input, config.reserve_zero_id)?);

        let traffic_result = analyzer.compute_overall_traffic()?;
        let outcome = CaseOutcome {
            index: index + 1,
            expected: case.expected.to_string(),
            actual: serialize_traffic_result(&traffic_result),
        };

        log::debug!("{}", outcome.verdict());
        outcomes.push(outcome);

        analyzer.reset_all();
    }

    Ok(outcomes)
}

/// Run the built-in reference cases
pub fn run_reference_cases(config: &Config) -> Result<Vec<CaseOutcome>, TrafficError> {
    run_cases(&reference_cases(), config)
}
