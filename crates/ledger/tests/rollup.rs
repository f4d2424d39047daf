//! End-to-end lifecycle tests: intake, optimistic commits, challenge-window finality and
//! execution against the strategy collaborators.

use l2y_rollup_ledger::prelude::*;
use l2y_rollup_params::RollupParams;
use l2y_rollup_primitives::{ExternalAddress, RollupEvent};
use l2y_rollup_test_utils::{logging::init_logging, BlockBuilder, DummyStrategy, OwnerKey};

const CHALLENGE_PERIOD: u64 = 1_000;
const ASSET_ADDR: ExternalAddress = ExternalAddress([0x11; 32]);
const STRATEGY_ADDR: ExternalAddress = ExternalAddress([0x22; 32]);

fn params() -> RollupParams {
    RollupParams {
        tree_depth: 16,
        block_challenge_period: CHALLENGE_PERIOD,
    }
}

/// A ledger with one registered asset (id 1), one attached strategy over it (id 1), and a
/// builder mirroring the binding. The returned [`DummyStrategy`] is a handle onto the attached
/// collaborator's state.
fn setup() -> (RollupLedger, BlockBuilder, OwnerKey, DummyStrategy) {
    init_logging();

    let mut registry = Registry::new();
    let asset_id = registry.register_asset(ASSET_ADDR).unwrap();
    let strategy_id = registry.register_strategy(STRATEGY_ADDR).unwrap();
    assert_eq!((asset_id, strategy_id), (1, 1));

    let strategy = DummyStrategy::new(ASSET_ADDR);
    let mut ledger = RollupLedger::new(params(), registry).unwrap();
    ledger
        .attach_strategy(strategy_id, Box::new(strategy.clone()))
        .unwrap();
    ledger.set_net_deposit_limit(asset_id, u128::MAX).unwrap();

    let mut builder = BlockBuilder::new(16);
    builder.bind_strategy_asset(strategy_id, asset_id);
    assert_eq!(builder.genesis_root(), ledger.genesis_root());

    (ledger, builder, OwnerKey::random(), strategy)
}

#[test]
fn deposit_requires_a_registered_asset_and_headroom() {
    let (mut ledger, _, owner, _) = setup();
    let account = owner.address();

    assert_eq!(
        ledger.deposit(account, 9, 100),
        Err(LedgerError::UnknownAsset(9))
    );

    ledger.set_net_deposit_limit(1, 150).unwrap();
    ledger.deposit(account, 1, 100).unwrap();
    assert_eq!(
        ledger.deposit(account, 1, 100),
        Err(LedgerError::NetDepositLimitExceeded)
    );
    ledger.deposit(account, 1, 50).unwrap();

    let events = ledger.take_events();
    assert_eq!(
        events[0],
        RollupEvent::AssetDeposited {
            account,
            asset_id: 1,
            amount: 100,
            block_id: 0,
        }
    );
    assert_eq!(ledger.pending_deposits().len(), 2);
}

#[test]
fn deposits_are_rejected_while_paused() {
    let (mut ledger, _, owner, _) = setup();

    ledger.pause().unwrap();
    assert_eq!(
        ledger.deposit(owner.address(), 1, 100),
        Err(LedgerError::Paused)
    );

    ledger.unpause().unwrap();
    ledger.deposit(owner.address(), 1, 100).unwrap();
}

#[test]
fn commit_requires_the_next_sequence_number_and_content() {
    let (mut ledger, mut builder, owner, _) = setup();
    let account = owner.address();
    ledger.deposit(account, 1, 500).unwrap();

    let block = vec![builder.init(), builder.deposit(account, 1, 1, 500)];

    assert_eq!(
        ledger.commit_block(3, &block, 0),
        Err(LedgerError::OutOfSequenceBlock {
            expected: 0,
            got: 3
        })
    );
    assert_eq!(ledger.commit_block(0, &[], 0), Err(LedgerError::EmptyBlock));

    // A deposit transition must match the oldest pending intake entry exactly.
    let mut forged = BlockBuilder::new(16);
    let wrong = vec![forged.init(), forged.deposit(account, 1, 1, 400)];
    assert_eq!(
        ledger.commit_block(0, &wrong, 0),
        Err(LedgerError::DepositMismatch)
    );
    assert_eq!(ledger.pending_deposits()[0].status, IntakeStatus::Pending);

    ledger.commit_block(0, &block, 0).unwrap();
    assert_eq!(ledger.next_block_id(), 1);
    assert_eq!(
        ledger.pending_deposits()[0].status,
        IntakeStatus::Included(0)
    );
    assert_eq!(ledger.block(0).unwrap().status, BlockStatus::Committed);
}

#[test]
fn execution_waits_out_the_challenge_window() {
    let (mut ledger, mut builder, owner, _) = setup();
    let account = owner.address();
    ledger.deposit(account, 1, 500).unwrap();

    let block = vec![builder.init(), builder.deposit(account, 1, 1, 500)];
    ledger.commit_block(0, &block, 100).unwrap();

    assert_eq!(
        ledger.execute_block(&[], 100 + CHALLENGE_PERIOD - 1),
        Err(LedgerError::ChallengePeriodNotOver)
    );
    assert_eq!(ledger.execute_block(&[], 100 + CHALLENGE_PERIOD), Ok(0));
    assert_eq!(ledger.block(0).unwrap().status, BlockStatus::Executed);
    assert_eq!(ledger.pending_deposits()[0].status, IntakeStatus::Cleared);

    assert_eq!(
        ledger.execute_block(&[], u64::MAX),
        Err(LedgerError::NoExecutableBlock)
    );
    assert!(ledger
        .take_events()
        .contains(&RollupEvent::RollupBlockExecuted { block_id: 0 }));
}

#[test]
fn challenge_period_changes_apply_to_later_blocks_only() {
    let (mut ledger, mut builder, owner, _) = setup();
    let account = owner.address();
    ledger.deposit(account, 1, 100).unwrap();
    ledger.deposit(account, 1, 100).unwrap();

    let block0 = vec![builder.init(), builder.deposit(account, 1, 1, 100)];
    ledger.commit_block(0, &block0, 0).unwrap();

    ledger.set_block_challenge_period(10);
    let block1 = vec![builder.deposit(account, 1, 1, 100)];
    ledger.commit_block(1, &block1, 0).unwrap();

    assert_eq!(ledger.block(0).unwrap().challenge_deadline(), CHALLENGE_PERIOD);
    assert_eq!(ledger.block(1).unwrap().challenge_deadline(), 10);

    // Execution is ordered, so the short window of block 1 still waits for block 0.
    assert_eq!(
        ledger.execute_block(&[], 10),
        Err(LedgerError::ChallengePeriodNotOver)
    );
    assert_eq!(ledger.execute_block(&[], CHALLENGE_PERIOD), Ok(0));
    assert_eq!(ledger.execute_block(&[], CHALLENGE_PERIOD), Ok(1));
}

#[test]
fn withdrawal_credit_is_paid_once() {
    let (mut ledger, mut builder, owner, _) = setup();
    let account = owner.address();
    ledger.deposit(account, 1, 500).unwrap();

    let block = vec![
        builder.init(),
        builder.deposit(account, 1, 1, 500),
        builder.withdraw(&owner, 1, 1, 200, 1),
    ];
    ledger.commit_block(0, &block, 0).unwrap();
    assert_eq!(ledger.pending_withdraw_commits(0).len(), 1);

    // Nothing is payable until the block survives its window and executes.
    assert_eq!(
        ledger.withdraw(&account, 1),
        Err(LedgerError::NothingToWithdraw)
    );

    ledger.execute_block(&[], CHALLENGE_PERIOD).unwrap();
    assert!(ledger.pending_withdraw_commits(0).is_empty());
    assert_eq!(ledger.pending_withdrawal(&account, 1), 200);
    assert_eq!(ledger.withdraw(&account, 1), Ok(200));
    assert_eq!(
        ledger.withdraw(&account, 1),
        Err(LedgerError::NothingToWithdraw)
    );
}

#[test]
fn executing_commitment_syncs_moves_net_principal() {
    let (mut ledger, mut builder, owner, _) = setup();
    let account = owner.address();
    ledger.deposit(account, 1, 1_000).unwrap();

    let mut block = vec![
        builder.init(),
        builder.deposit(account, 1, 1, 1_000),
        builder.commit(&owner, 1, 1, 600, 1),
        builder.uncommit(&owner, 1, 1, 100, 2),
    ];
    let sync = builder.sync_commitment(1);
    block.push(sync.clone());
    ledger.commit_block(0, &block, 0).unwrap();

    // 600 committed, 100 st tokens uncommitted 1:1, so 500 net flows in.
    ledger.execute_block(&[sync], CHALLENGE_PERIOD).unwrap();
    assert_eq!(ledger.strategy(1).unwrap().balance(), 500);
}

#[test]
fn execution_intents_must_match_the_commitment() {
    let (mut ledger, mut builder, owner, _) = setup();
    let account = owner.address();
    ledger.deposit(account, 1, 1_000).unwrap();

    let mut block = vec![
        builder.init(),
        builder.deposit(account, 1, 1, 1_000),
        builder.commit(&owner, 1, 1, 600, 1),
    ];
    let sync = builder.sync_commitment(1);
    block.push(sync.clone());
    ledger.commit_block(0, &block, 0).unwrap();

    assert_eq!(
        ledger.execute_block(&[], CHALLENGE_PERIOD),
        Err(LedgerError::IntentMismatch)
    );
    assert_eq!(ledger.execute_block(&[sync], CHALLENGE_PERIOD), Ok(0));
    assert_eq!(ledger.strategy(1).unwrap().balance(), 600);
}

#[test]
fn balance_sync_reports_yield_only() {
    let (mut ledger, mut builder, owner, strategy) = setup();
    let account = owner.address();
    ledger.deposit(account, 1, 1_000).unwrap();

    let mut block = vec![
        builder.init(),
        builder.deposit(account, 1, 1, 1_000),
        builder.commit(&owner, 1, 1, 600, 1),
    ];
    let sync = builder.sync_commitment(1);
    block.push(sync.clone());
    ledger.commit_block(0, &block, 0).unwrap();
    ledger.execute_block(&[sync], CHALLENGE_PERIOD).unwrap();

    // Principal moved at execution is not yield.
    ledger.sync_balance(1).unwrap();
    assert_eq!(ledger.pending_balance_syncs()[0].item.delta, 0);

    // Accrued yield is.
    strategy.accrue(42);
    ledger.sync_balance(1).unwrap();
    assert_eq!(ledger.pending_balance_syncs()[1].item.delta, 42);
    assert_eq!(strategy.commits(), vec![600]);
}

#[test]
fn balance_sync_deltas_must_be_committed_in_order() {
    let (mut ledger, mut builder, owner, _) = setup();
    let account = owner.address();
    ledger.deposit(account, 1, 100).unwrap();
    ledger.sync_balance(1).unwrap();

    let block = vec![
        builder.init(),
        builder.deposit(account, 1, 1, 100),
        builder.sync_balance(1, 7),
    ];
    assert_eq!(
        ledger.commit_block(0, &block, 0),
        Err(LedgerError::BalanceSyncMismatch)
    );
}

#[test]
fn balance_syncs_are_consumed_in_queue_order() {
    let (mut ledger, mut builder, owner, strategy) = setup();
    let account = owner.address();
    ledger.deposit(account, 1, 100).unwrap();

    strategy.accrue(5);
    ledger.sync_balance(1).unwrap();
    strategy.accrue(7);
    ledger.sync_balance(1).unwrap();

    // Committing the newer entry ahead of the older one is rejected.
    let mut reordered = BlockBuilder::new(16);
    reordered.bind_strategy_asset(1, 1);
    let wrong = vec![
        reordered.init(),
        reordered.deposit(account, 1, 1, 100),
        reordered.sync_balance(1, 7),
        reordered.sync_balance(1, 5),
    ];
    assert_eq!(
        ledger.commit_block(0, &wrong, 0),
        Err(LedgerError::BalanceSyncMismatch)
    );
    assert_eq!(ledger.pending_balance_syncs()[0].status, IntakeStatus::Pending);

    // The same entries in enqueue order commit fine.
    let block = vec![
        builder.init(),
        builder.deposit(account, 1, 1, 100),
        builder.sync_balance(1, 5),
        builder.sync_balance(1, 7),
    ];
    ledger.commit_block(0, &block, 0).unwrap();
    assert_eq!(
        ledger.pending_balance_syncs()[0].status,
        IntakeStatus::Included(0)
    );
    assert_eq!(
        ledger.pending_balance_syncs()[1].status,
        IntakeStatus::Included(0)
    );
}

#[test]
fn drain_requires_pause() {
    let (mut ledger, _, _, _) = setup();

    assert_eq!(ledger.drain_asset(1, 100), Err(LedgerError::NotPaused));
    ledger.pause().unwrap();
    ledger.drain_asset(1, 100).unwrap();
}
