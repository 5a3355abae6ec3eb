//! Span-length adjudication for subspaces

use super::EVALUATE_ALTERNATIVE;
use crate::codelet::{ArgValue, Arguments, Codelet, Urgency};
use crate::controller::Controller;
use crate::error::FamilyError;
use crate::family::Family;
use crate::subspace::{Adjudicator, Contest, Verdict};

/// Side of a contest a codelet argues for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The newly proposed group
    Proposal,
    /// The groups already present
    Incumbents,
}

impl Side {
    fn as_str(self) -> &'static str {
        match self {
            Self::Proposal => "proposal",
            Self::Incumbents => "incumbents",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name {
            "proposal" => Some(Self::Proposal),
            "incumbents" => Some(Self::Incumbents),
            _ => None,
        }
    }
}

/// Total number of positions each side covers
fn strengths(contest: &Contest) -> (usize, usize) {
    let proposal = contest.proposal().span().len();
    let incumbents = contest
        .incumbents()
        .iter()
        .map(|(_, group)| group.span().len())
        .fold(0, usize::saturating_add);
    (proposal, incumbents)
}

/// Declares a verdict for `side` when its `strength` beats the rival side
///
/// The proposal needs a strictly longer total span; ties go to the
/// incumbents. Outside a subspace this fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvaluateAlternative;

impl EvaluateAlternative {
    /// Codelet arguing for `side` with `strength`
    #[must_use]
    pub fn codelet(side: Side, strength: usize, urgency: Urgency) -> Codelet {
        Codelet::new(
            EVALUATE_ALTERNATIVE,
            Arguments::new()
                .with("side", ArgValue::Text(side.as_str().to_string()))
                .with(
                    "strength",
                    ArgValue::Int(i64::try_from(strength).unwrap_or(i64::MAX)),
                ),
            urgency,
        )
    }
}

impl Family for EvaluateAlternative {
    fn run(&self, controller: &mut Controller, args: &Arguments) -> Result<(), FamilyError> {
        let side = Side::parse(&args.text("side")?).ok_or(FamilyError::ArgumentType {
            name: "side".to_string(),
            expected: "proposal or incumbents",
        })?;
        let strength = args.int("strength")?;
        let contest = controller
            .contest()
            .ok_or_else(|| FamilyError::Failed("evaluate_alternative outside a subspace".into()))?;

        let (proposal, incumbents) = strengths(contest);
        let rival = match side {
            Side::Proposal => incumbents,
            Side::Incumbents => proposal,
        };
        let rival = i64::try_from(rival).unwrap_or(i64::MAX);

        let wins = match side {
            Side::Proposal => strength > rival,
            Side::Incumbents => strength >= rival,
        };
        if wins {
            controller.declare_verdict(match side {
                Side::Proposal => Verdict::Proposal,
                Side::Incumbents => Verdict::Incumbents,
            });
        }
        Ok(())
    }
}

/// Seeds one `evaluate_alternative` codelet per side
///
/// The longer total span wins; which codelet is drawn first only changes
/// how many subspace steps the decision takes.
#[derive(Debug, Clone, Copy)]
pub struct SpanLengthAdjudicator {
    urgency: Urgency,
}

impl SpanLengthAdjudicator {
    /// Create with the urgency given to seeded codelets
    #[must_use]
    pub fn new(urgency: Urgency) -> Self {
        Self { urgency }
    }
}

impl Default for SpanLengthAdjudicator {
    fn default() -> Self {
        Self::new(Urgency::NORMAL)
    }
}

impl Adjudicator for SpanLengthAdjudicator {
    fn seed(&self, contest: &Contest) -> Vec<Codelet> {
        let (proposal, incumbents) = strengths(contest);
        vec![
            EvaluateAlternative::codelet(Side::Proposal, proposal, self.urgency),
            EvaluateAlternative::codelet(Side::Incumbents, incumbents, self.urgency),
        ]
    }
}
