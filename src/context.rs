//! Conversation scoping and page-context hints.
//!
//! The backend tailors answers to the flow the user is in (placement prep,
//! exam prep, peer learning), so every query carries a short context hint
//! derived from the active route.

use serde::{Deserialize, Serialize};

/// Which part of the study app the user is currently on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageContext {
    /// Placement preparation pages.
    Placement,
    /// Exam preparation and onboarding pages.
    ExamPrep,
    /// Peer learning pages.
    PeerLearning,
    /// Any other page; no hint is sent.
    #[default]
    Other,
}

impl PageContext {
    /// Classify a route path.
    pub fn from_path(path: &str) -> Self {
        if path.contains("/placement") {
            Self::Placement
        } else if path.contains("/exam") || path.contains("/onboarding") {
            Self::ExamPrep
        } else if path.contains("/peer") {
            Self::PeerLearning
        } else {
            Self::Other
        }
    }

    /// Context hint sent to the query service; empty when no flow is active.
    pub fn hint(self) -> &'static str {
        match self {
            Self::Placement => "User is on placement preparation page",
            Self::ExamPrep => "User is on exam preparation page",
            Self::PeerLearning => "User is on peer learning page",
            Self::Other => "",
        }
    }
}

/// What one widget instance's conversation is about.
///
/// The site-wide assistant answers general questions steered by the active
/// page; the plan-bound assistant answers against one study plan's
/// materials and owns a server-side history that can be cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationScope {
    /// Site-wide assistant.
    Global {
        /// Active page, for the context hint.
        page: PageContext,
    },
    /// Assistant bound to one study plan.
    StudyPlan {
        /// The plan the conversation is about.
        plan_id: i64,
    },
}

impl ConversationScope {
    /// Study plan id, when plan-scoped.
    pub fn plan_id(&self) -> Option<i64> {
        match self {
            Self::Global { .. } => None,
            Self::StudyPlan { plan_id } => Some(*plan_id),
        }
    }

    /// Context hint for outbound queries.
    pub fn context_hint(&self) -> &'static str {
        match self {
            Self::Global { page } => page.hint(),
            Self::StudyPlan { .. } => "",
        }
    }
}
