use derive_more::Display;

/// Upload-page state machine: `idle → uploading → analyzing → done|failed`,
/// driven entirely by request completion events, never by timers. A submit
/// with `analyze` set chains straight from a successful upload into the
/// analysis call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum UploadFlow {
    #[display(fmt = "idle")]
    Idle,
    #[display(fmt = "uploading")]
    Uploading { analyze: bool },
    #[display(fmt = "analyzing")]
    Analyzing,
    #[display(fmt = "done")]
    Done,
    #[display(fmt = "failed")]
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowEvent {
    Submit { analyze: bool },
    UploadOk,
    UploadErr,
    AnalyzeOk,
    AnalyzeErr,
    Reset,
}

impl UploadFlow {
    /// Apply one event. Events that are impossible in the current state
    /// (a completion for a request this state never issued) leave the state
    /// unchanged, so stale responses cannot corrupt the flow.
    pub fn advance(self, event: FlowEvent) -> Self {
        use FlowEvent::*;
        match (self, event) {
            (UploadFlow::Idle | UploadFlow::Done | UploadFlow::Failed, Submit { analyze }) => {
                UploadFlow::Uploading { analyze }
            }
            (UploadFlow::Uploading { analyze: true }, UploadOk) => UploadFlow::Analyzing,
            (UploadFlow::Uploading { analyze: false }, UploadOk) => UploadFlow::Done,
            (UploadFlow::Uploading { .. }, UploadErr) => UploadFlow::Failed,
            (UploadFlow::Analyzing, AnalyzeOk) => UploadFlow::Done,
            (UploadFlow::Analyzing, AnalyzeErr) => UploadFlow::Failed,
            (_, Reset) => UploadFlow::Idle,
            (state, _) => state,
        }
    }

    pub fn in_flight(self) -> bool {
        matches!(self, UploadFlow::Uploading { .. } | UploadFlow::Analyzing)
    }

    /// The submit control is enabled only with a file chosen and no request
    /// in flight.
    pub fn can_submit(self, file_chosen: bool) -> bool {
        file_chosen && !self.in_flight()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use FlowEvent::*;

    #[test]
    fn upload_then_analyze_reaches_done() {
        let flow = UploadFlow::Idle
            .advance(Submit { analyze: true })
            .advance(UploadOk);
        assert_eq!(flow, UploadFlow::Analyzing);
        assert_eq!(flow.advance(AnalyzeOk), UploadFlow::Done);
    }

    #[test]
    fn upload_only_skips_analysis() {
        let flow = UploadFlow::Idle
            .advance(Submit { analyze: false })
            .advance(UploadOk);
        assert_eq!(flow, UploadFlow::Done);
    }

    #[test]
    fn failures_are_terminal_until_resubmit() {
        let flow = UploadFlow::Idle
            .advance(Submit { analyze: true })
            .advance(UploadErr);
        assert_eq!(flow, UploadFlow::Failed);
        assert_eq!(
            flow.advance(Submit { analyze: false }),
            UploadFlow::Uploading { analyze: false }
        );
    }

    #[test]
    fn stale_completions_are_ignored() {
        assert_eq!(UploadFlow::Idle.advance(UploadOk), UploadFlow::Idle);
        assert_eq!(UploadFlow::Done.advance(AnalyzeErr), UploadFlow::Done);
    }

    #[test]
    fn submit_gated_on_file_and_flight() {
        assert!(UploadFlow::Idle.can_submit(true));
        assert!(!UploadFlow::Idle.can_submit(false));
        assert!(!UploadFlow::Uploading { analyze: true }.can_submit(true));
        assert!(!UploadFlow::Analyzing.can_submit(true));
        assert!(UploadFlow::Failed.can_submit(true));
    }

    #[test]
    fn reset_returns_to_idle_from_anywhere() {
        assert_eq!(UploadFlow::Done.advance(Reset), UploadFlow::Idle);
        assert_eq!(UploadFlow::Analyzing.advance(Reset), UploadFlow::Idle);
    }

    #[test]
    fn phase_labels_are_stable() {
        assert_eq!(UploadFlow::Idle.to_string(), "idle");
        assert_eq!(UploadFlow::Uploading { analyze: true }.to_string(), "uploading");
        assert_eq!(UploadFlow::Analyzing.to_string(), "analyzing");
    }
}
