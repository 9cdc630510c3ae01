//! Validation of incoming messages against the state of an instance.
//!
//! These functions never mutate the state: a message either passes and is
//! handed to its transition, or is rejected with the cause.

use alloc::boxed::Box;
use alloc::collections::BTreeSet;

use qbft_core_types::{Context, MessageType, OperatorId, Round, SignedMessage, Value, ValueRoot};
use qbft_signing::{check_signers, VerificationError};

use crate::{Environment, Error, State};

/// Check that the message belongs to this instance and is not for a past round.
pub fn validate_base<Ctx: Context>(state: &State<Ctx>, msg: &SignedMessage<Ctx>) -> Result<(), Error> {
    if msg.identifier() != &state.identifier {
        return Err(Error::WrongIdentifier);
    }

    if msg.height() != state.height {
        return Err(Error::WrongHeight);
    }

    if msg.round() < state.round {
        return Err(Error::PastRound);
    }

    Ok(())
}

/// Check that the signer list is well-formed and holds exactly one signer.
///
/// Malformed signer lists are reported as such, before their length.
pub fn check_single_signer<Ctx: Context>(msg: &SignedMessage<Ctx>) -> Result<OperatorId, Error> {
    check_signers(&msg.signers)?;
    msg.signer().ok_or(Error::SingleSignerRequired)
}

/// Verify every signature of the message against the committee.
pub fn verify_signature<Ctx: Context>(
    env: &Environment<Ctx>,
    state: &State<Ctx>,
    msg: &SignedMessage<Ctx>,
) -> Result<(), Error> {
    env.signer
        .verify_signed_message(msg, env.ctx.domain(), &state.committee)?;

    Ok(())
}

fn check_type<Ctx: Context>(msg: &SignedMessage<Ctx>, expected: MessageType) -> Result<(), Error> {
    if msg.msg_type() != expected {
        return Err(Error::UnexpectedJustificationType(msg.msg_type()));
    }

    Ok(())
}

/// Validate a proposal received in any round at or above the local round.
pub fn validate_proposal<Ctx: Context>(
    env: &Environment<Ctx>,
    state: &State<Ctx>,
    msg: &SignedMessage<Ctx>,
) -> Result<(), Error> {
    let signer = check_single_signer(msg)?;
    verify_signature(env, state, msg)?;

    let round = msg.round();
    let leader = env.ctx.select_proposer(&state.committee, state.height, round);
    if signer != leader {
        return Err(Error::InvalidLeader);
    }

    let value = msg.message.value().ok_or(Error::MissingProposal)?;

    validate_proposal_justification(
        env,
        state,
        round,
        value,
        msg.message.round_change_justification(),
        msg.message.prepare_justification(),
    )?;

    let fresh_in_current_round =
        round == state.round && state.proposal_accepted_for_current_round.is_none();

    if !fresh_in_current_round && round <= state.round {
        return Err(Error::ProposalNotValidWithCurrentState);
    }

    Ok(())
}

/// Check that proposing `value` in `round` is justified.
///
/// In the first round any valid value is justified. Above it, a quorum of
/// round changes for the round is required and, if any of them reports a
/// preparation, the value must be the highest prepared one and come with a
/// quorum of prepares for it.
pub fn validate_proposal_justification<Ctx: Context>(
    env: &Environment<Ctx>,
    state: &State<Ctx>,
    round: Round,
    value: &Value,
    round_changes: &[SignedMessage<Ctx>],
    prepares: &[SignedMessage<Ctx>],
) -> Result<(), Error> {
    env.ctx.check_value(value).map_err(Error::InvalidValue)?;

    if round.is_first() {
        return Ok(());
    }

    for rc in round_changes {
        check_type(rc, MessageType::RoundChange)
            .and_then(|()| validate_round_change(env, state, rc, round))
            .map_err(|e| Error::InvalidRoundChangeJustification(Box::new(e)))?;
    }

    if distinct_signers(round_changes) < state.committee.quorum() {
        return Err(Error::RoundChangeNoQuorum);
    }

    let Some(highest) = highest_prepared(round_changes) else {
        return Ok(());
    };

    let (prepared_round, prepared_root) = match (
        highest.message.prepared_round(),
        highest.message.value_root(),
    ) {
        (Some(prepared_round), Some(root)) => (prepared_round, root),
        _ => return Err(Error::MissingProposal),
    };

    if value.root() != prepared_root {
        return Err(Error::HighestPreparedMismatch);
    }

    let signers = validate_prepare_justification(env, state, prepares, prepared_round, &prepared_root)?;
    if signers < state.committee.quorum() {
        return Err(Error::PrepareJustificationNoQuorum);
    }

    Ok(())
}

/// Validate a round change for `round`.
///
/// A round change reporting a preparation must carry prepares that agree
/// with it. The prepares need not form a quorum here.
pub fn validate_round_change<Ctx: Context>(
    env: &Environment<Ctx>,
    state: &State<Ctx>,
    msg: &SignedMessage<Ctx>,
    round: Round,
) -> Result<(), Error> {
    check_single_signer(msg)?;
    verify_signature(env, state, msg)?;

    if msg.height() != state.height {
        return Err(Error::WrongHeight);
    }

    if msg.round() != round {
        return Err(Error::WrongRound);
    }

    let Some(prepared_round) = msg.message.prepared_round() else {
        return Ok(());
    };

    if prepared_round >= round {
        return Err(Error::InvalidPreparedRound);
    }

    let root = msg.message.value_root().ok_or(Error::MissingProposal)?;

    validate_prepare_justification(
        env,
        state,
        msg.message.prepare_justification(),
        prepared_round,
        &root,
    )?;

    Ok(())
}

/// Validate prepares justifying a preparation of `root` in `round`.
///
/// Returns the number of signers, all distinct.
pub fn validate_prepare_justification<Ctx: Context>(
    env: &Environment<Ctx>,
    state: &State<Ctx>,
    prepares: &[SignedMessage<Ctx>],
    round: Round,
    root: &ValueRoot,
) -> Result<usize, Error> {
    let mut signers = BTreeSet::new();

    for prepare in prepares {
        let signer = check_type(prepare, MessageType::Prepare)
            .and_then(|()| validate_prepare_for(env, state, prepare, round, root))
            .map_err(|e| Error::InvalidPrepareJustification(Box::new(e)))?;

        if !signers.insert(signer) {
            return Err(Error::InvalidPrepareJustification(Box::new(
                VerificationError::NonUniqueSigner.into(),
            )));
        }
    }

    Ok(signers.len())
}

fn validate_prepare_for<Ctx: Context>(
    env: &Environment<Ctx>,
    state: &State<Ctx>,
    prepare: &SignedMessage<Ctx>,
    round: Round,
    root: &ValueRoot,
) -> Result<OperatorId, Error> {
    let signer = check_single_signer(prepare)?;
    verify_signature(env, state, prepare)?;

    if prepare.height() != state.height {
        return Err(Error::WrongHeight);
    }

    if prepare.round() != round {
        return Err(Error::WrongRound);
    }

    if prepare.message.value_root().as_ref() != Some(root) {
        return Err(Error::DataMismatch);
    }

    Ok(signer)
}

/// Validate a prepare or commit against the proposal accepted in the current round.
///
/// The structure of the signer list is checked before anything else.
pub fn validate_vote<Ctx: Context>(
    env: &Environment<Ctx>,
    state: &State<Ctx>,
    msg: &SignedMessage<Ctx>,
) -> Result<(), Error> {
    check_signers(&msg.signers)?;

    let proposal = state
        .proposal_accepted_for_current_round
        .as_ref()
        .ok_or(Error::NoProposalForRound)?;

    if msg.round() != proposal.round() {
        return Err(Error::WrongRound);
    }

    if msg.message.value_root() != proposal.message.value_root() {
        return Err(Error::DataMismatch);
    }

    check_single_signer(msg)?;
    verify_signature(env, state, msg)?;

    Ok(())
}

/// Whether a round change can back a proposal: it reports no preparation,
/// or carries a quorum of valid prepares for the value it prepared.
pub fn is_justified_round_change<Ctx: Context>(
    env: &Environment<Ctx>,
    state: &State<Ctx>,
    rc: &SignedMessage<Ctx>,
) -> bool {
    let Some(prepared_round) = rc.message.prepared_round() else {
        return true;
    };

    let Some(root) = rc.message.value_root() else {
        return false;
    };

    validate_prepare_justification(
        env,
        state,
        rc.message.prepare_justification(),
        prepared_round,
        &root,
    )
    .is_ok_and(|signers| signers >= state.committee.quorum())
}

/// Return the round change reporting the highest prepared round, the first
/// one received on ties.
pub fn highest_prepared<Ctx: Context>(
    round_changes: &[SignedMessage<Ctx>],
) -> Option<&SignedMessage<Ctx>> {
    let mut highest: Option<(Round, &SignedMessage<Ctx>)> = None;

    for rc in round_changes {
        if let Some(round) = rc.message.prepared_round() {
            if highest.map_or(true, |(best, _)| round > best) {
                highest = Some((round, rc));
            }
        }
    }

    highest.map(|(_, rc)| rc)
}

/// Number of distinct signers across the given messages.
pub fn distinct_signers<'a, Ctx: Context>(
    msgs: impl IntoIterator<Item = &'a SignedMessage<Ctx>>,
) -> usize {
    msgs.into_iter()
        .flat_map(|msg| msg.signers.iter().copied())
        .collect::<BTreeSet<_>>()
        .len()
}
