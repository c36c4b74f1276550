/// Defines study phases and how the session moves through them
pub trait Phase: Copy + Clone + PartialEq + Send + Sync + std::fmt::Debug + Default {
    /// Phases that wait for a keypress before advancing
    fn advances_on_key(&self) -> bool;
    fn next(&self) -> Option<Self>;

    fn is_trials(&self) -> bool {
        false
    }

    fn is_farewell(&self) -> bool {
        false
    }

    fn is_terminal(&self) -> bool {
        false
    }
}

#[derive(Copy, Debug, Clone, PartialEq, Eq, Default)]
pub enum StudyPhase {
    #[default]
    Welcome,
    Instructions,
    TaskInstructions,
    Trials,
    Farewell,
    Finished,
    Aborted,
}

impl Phase for StudyPhase {
    fn advances_on_key(&self) -> bool {
        matches!(
            self,
            Self::Welcome | Self::Instructions | Self::TaskInstructions
        )
    }

    fn next(&self) -> Option<Self> {
        use StudyPhase::*;
        Some(match self {
            Welcome => Instructions,
            Instructions => TaskInstructions,
            TaskInstructions => Trials,
            Trials => Farewell,
            Farewell => Finished,
            Finished | Aborted => return None,
        })
    }

    fn is_trials(&self) -> bool {
        matches!(self, StudyPhase::Trials)
    }

    fn is_farewell(&self) -> bool {
        matches!(self, StudyPhase::Farewell)
    }

    fn is_terminal(&self) -> bool {
        matches!(self, StudyPhase::Finished | StudyPhase::Aborted)
    }
}
