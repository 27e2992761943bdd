//! Staking Service - the ledger state machine
//!
//! Every mutating operation runs in three phases:
//!
//! 1. **Plan** (state lock held): authorize, validate status and amounts,
//!    snapshot the record, mark the node in flight and reserve a registry
//!    slot when joining.
//! 2. **Effects** (no lock held): collaborator calls inside a journaled
//!    [`CustodyTransaction`]; any failure unwinds the journal.
//! 3. **Commit** (state lock held): write the staged record, registry
//!    membership and custody counters. Commit cannot fail.
//!
//! A node that is in flight rejects further mutations until its operation
//! finishes, so a reentrant collaborator never observes or changes a record
//! mid-operation.

use crate::config::{validate_administrator, StakingConfig};
use crate::custody::{CustodyAdapter, CustodyTransaction};
use crate::domain::{
    invariant_conservation, invariant_membership, invariant_positive_stake, reconcile,
    verify_payment, Address, Amount, CustodyTotals, NodeRegistry, NodeStatus, Operation, Role,
    StakeAdjustment, StakingError, StakingRecord, StakingResult, StakingStore,
};
use crate::events::StakingEvent;
use crate::ports::{
    Clock, CreditsService, PayoutResolver, SlashingCollaborator, StakingApi, ValueTransfer,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Committed ledger state plus in-flight bookkeeping.
struct LedgerState {
    config: StakingConfig,
    registry: NodeRegistry,
    store: StakingStore,
    totals: CustodyTotals,
    /// Nodes with an operation between plan and commit.
    in_flight: HashSet<Address>,
    /// Registry slots held by in-flight joins.
    reserved_slots: usize,
}

impl LedgerState {
    fn new(config: StakingConfig) -> Self {
        Self {
            config,
            registry: NodeRegistry::new(),
            store: StakingStore::new(),
            totals: CustodyTotals::default(),
            in_flight: HashSet::new(),
            reserved_slots: 0,
        }
    }

    fn ensure_idle(&self, node: &Address) -> StakingResult<()> {
        if self.in_flight.contains(node) {
            return Err(StakingError::OperationInProgress { node: *node });
        }
        Ok(())
    }

    fn ensure_owner(&self, caller: &Address) -> StakingResult<()> {
        if *caller != self.config.owner {
            return Err(StakingError::Unauthorized {
                caller: *caller,
                role: Role::Owner,
            });
        }
        Ok(())
    }

    fn ensure_administrator(&self, caller: &Address) -> StakingResult<()> {
        match self.config.administrator {
            None => Err(StakingError::AdministratorNotSet),
            Some(administrator) if administrator == *caller => Ok(()),
            Some(_) => Err(StakingError::Unauthorized {
                caller: *caller,
                role: Role::Administrator,
            }),
        }
    }

    /// Committed record of a registered node, or a zero-valued record.
    fn staking_info(&self, node: &Address) -> StakingRecord {
        if self.registry.contains(node) {
            self.store.get_or_create(node)
        } else {
            StakingRecord::new(*node)
        }
    }

    fn release(&mut self, node: &Address, reserved_slot: bool) {
        self.in_flight.remove(node);
        if reserved_slot {
            self.reserved_slots = self.reserved_slots.saturating_sub(1);
        }
    }
}

/// Marks a node in flight from plan until commit or abort.
///
/// Dropping the guard without committing releases the node and any reserved
/// registry slot, leaving committed state untouched.
struct OperationGuard {
    state: Arc<RwLock<LedgerState>>,
    node: Address,
    reserved_slot: bool,
    finished: bool,
}

impl OperationGuard {
    fn commit<R>(mut self, apply: impl FnOnce(&mut LedgerState) -> R) -> R {
        let state = Arc::clone(&self.state);
        let mut ledger = state.write();
        let output = apply(&mut ledger);
        ledger.release(&self.node, self.reserved_slot);
        self.finished = true;
        output
    }
}

impl Drop for OperationGuard {
    fn drop(&mut self) {
        if !self.finished {
            self.state.write().release(&self.node, self.reserved_slot);
        }
    }
}

/// Planned stake operation.
struct StakePlan {
    guard: OperationGuard,
    record: StakingRecord,
}

/// Planned withdrawal or slash.
struct ExitPlan {
    guard: OperationGuard,
    record: StakingRecord,
    treasury: Address,
}

/// Staking ledger service.
pub struct StakingService<C, P, S, T, K>
where
    C: CreditsService,
    P: PayoutResolver,
    S: SlashingCollaborator,
    T: ValueTransfer,
    K: Clock,
{
    state: Arc<RwLock<LedgerState>>,
    custody: CustodyAdapter<C, P, S, T>,
    clock: Arc<K>,
    events: broadcast::Sender<StakingEvent>,
}

impl<C, P, S, T, K> StakingService<C, P, S, T, K>
where
    C: CreditsService,
    P: PayoutResolver,
    S: SlashingCollaborator,
    T: ValueTransfer,
    K: Clock,
{
    /// Create a ledger with empty state.
    pub fn new(
        config: StakingConfig,
        credits: Arc<C>,
        payout: Arc<P>,
        slashing: Arc<S>,
        transfer: Arc<T>,
        clock: Arc<K>,
    ) -> StakingResult<Self> {
        config.validate()?;
        let (events, _) = broadcast::channel(config.event_channel_capacity);

        info!(
            "[qc-18] Staking ledger ready: min stake {}, cool-down {}s, capacity {}",
            config.minimum_stake, config.force_unstake_delay_secs, config.max_participants
        );

        Ok(Self {
            state: Arc::new(RwLock::new(LedgerState::new(config))),
            custody: CustodyAdapter::new(credits, payout, slashing, transfer),
            clock,
            events,
        })
    }

    /// Receive events, published under the state lock as each operation
    /// commits, so per-node order matches commit order.
    pub fn subscribe(&self) -> broadcast::Receiver<StakingEvent> {
        self.events.subscribe()
    }

    #[must_use]
    pub fn participant_count(&self) -> usize {
        self.state.read().registry.len()
    }

    #[must_use]
    pub fn is_participant(&self, node: &Address) -> bool {
        self.state.read().registry.contains(node)
    }

    /// Native custody counters.
    #[must_use]
    pub fn custody_totals(&self) -> CustodyTotals {
        self.state.read().totals
    }

    /// Verify membership, positive-stake and conservation invariants over
    /// committed state.
    pub fn check_invariants(&self) -> StakingResult<()> {
        let state = self.state.read();
        invariant_membership(&state.registry, &state.store)?;
        invariant_positive_stake(&state.store)?;
        invariant_conservation(&state.store, &state.totals)
    }

    /// Never blocks; safe to call with the state lock held.
    fn publish(&self, event: StakingEvent) {
        if self.events.send(event).is_err() {
            debug!("[qc-18] No event subscribers");
        }
    }

    fn guard(&self, node: Address, reserved_slot: bool) -> OperationGuard {
        OperationGuard {
            state: Arc::clone(&self.state),
            node,
            reserved_slot,
            finished: false,
        }
    }

    // =========================================================================
    // PLANNING (state lock held, no I/O)
    // =========================================================================

    fn plan_stake(&self, node: Address, requested_total: Amount) -> StakingResult<StakePlan> {
        let mut ledger = self.state.write();
        let state = &mut *ledger;

        state.ensure_idle(&node)?;

        let record = state.staking_info(&node);
        if record.status == NodeStatus::PendingUnstaked {
            return Err(StakingError::InvalidStatus {
                node,
                status: record.status,
                operation: Operation::Stake,
            });
        }

        if requested_total.is_zero() {
            return Err(StakingError::ZeroAmount);
        }
        if requested_total < state.config.minimum_stake {
            return Err(StakingError::BelowMinimumStake {
                requested: requested_total,
                minimum: state.config.minimum_stake,
            });
        }

        let joining = !state.registry.contains(&node);
        if joining {
            let occupied = state.registry.len().saturating_add(state.reserved_slots);
            if occupied >= state.config.max_participants {
                return Err(StakingError::RegistryFull {
                    max: state.config.max_participants,
                });
            }
            state.reserved_slots += 1;
        }
        state.in_flight.insert(node);

        debug!(
            "[qc-18] Planned stake for {}: {} -> {} (joining: {})",
            node,
            record.native_balance.saturating_add(record.credits_balance),
            requested_total,
            joining
        );

        Ok(StakePlan {
            guard: self.guard(node, joining),
            record,
        })
    }

    fn plan_exit(
        &self,
        caller: Address,
        node: Address,
        operation: Operation,
    ) -> StakingResult<ExitPlan> {
        let now = self.clock.now();
        let mut ledger = self.state.write();
        let state = &mut *ledger;

        if matches!(operation, Operation::AdminUnstake | Operation::Slash) {
            state.ensure_administrator(&caller)?;
        }
        state.ensure_idle(&node)?;

        let record = state.staking_info(&node);
        let legal = match operation {
            Operation::ForceUnstake => record.status == NodeStatus::PendingUnstaked,
            Operation::AdminUnstake | Operation::Slash => record.status.is_participating(),
            Operation::Stake | Operation::RequestUnstake => false,
        };
        if !legal {
            return Err(StakingError::InvalidStatus {
                node,
                status: record.status,
                operation,
            });
        }

        if operation == Operation::ForceUnstake {
            let requested_at =
                record
                    .unstake_requested_at
                    .ok_or(StakingError::InvalidStatus {
                        node,
                        status: record.status,
                        operation,
                    })?;
            // An unlock time past the end of the clock never arrives.
            let unlocks_at = requested_at.saturating_add(state.config.force_unstake_delay_secs);
            if now <= unlocks_at {
                return Err(StakingError::CooldownActive {
                    node,
                    now,
                    unlocks_at,
                });
            }
        }

        if record.total_stake()?.is_zero() {
            return Err(StakingError::ZeroStake { node });
        }

        state.in_flight.insert(node);

        Ok(ExitPlan {
            guard: self.guard(node, false),
            record,
            treasury: state.config.owner,
        })
    }

    fn apply_unstake_request(&self, node: Address) -> StakingResult<StakingRecord> {
        let now = self.clock.now();
        let mut ledger = self.state.write();
        let state = &mut *ledger;

        state.ensure_idle(&node)?;

        let mut record = state.staking_info(&node);
        if record.status != NodeStatus::Staked {
            return Err(StakingError::InvalidStatus {
                node,
                status: record.status,
                operation: Operation::RequestUnstake,
            });
        }

        record.status = NodeStatus::PendingUnstaked;
        record.unstake_requested_at = Some(now);
        state.store.put(record.clone());
        self.publish(StakingEvent::NodeTryUnstaked {
            node,
            requested_at: now,
        });
        Ok(record)
    }

    // =========================================================================
    // EFFECTS (no lock held)
    // =========================================================================

    async fn adjustment_effects(
        &self,
        tx: &mut CustodyTransaction<'_, C, P, S, T>,
        node: &Address,
        adjustment: &StakeAdjustment,
    ) -> StakingResult<()> {
        match *adjustment {
            StakeAdjustment::Increase {
                credits_to_lock, ..
            } => tx.lock_credits(node, credits_to_lock).await,
            StakeAdjustment::Decrease {
                native_to_return,
                credits_to_release,
            } => {
                let payout = if native_to_return.is_zero() {
                    None
                } else {
                    Some(self.custody.resolve_payout(node).await?)
                };
                tx.release_credits(node, credits_to_release).await?;
                if let Some(payout) = payout {
                    tx.pay(&payout, native_to_return).await?;
                }
                Ok(())
            }
            StakeAdjustment::Unchanged => Ok(()),
        }
    }

    async fn withdrawal_effects(
        &self,
        tx: &mut CustodyTransaction<'_, C, P, S, T>,
        record: &StakingRecord,
    ) -> StakingResult<()> {
        let payout = if record.native_balance.is_zero() {
            None
        } else {
            Some(self.custody.resolve_payout(&record.node).await?)
        };
        tx.release_credits(&record.node, record.credits_balance)
            .await?;
        if let Some(payout) = payout {
            tx.pay(&payout, record.native_balance).await?;
        }
        Ok(())
    }

    async fn slash_effects(
        &self,
        tx: &mut CustodyTransaction<'_, C, P, S, T>,
        record: &StakingRecord,
        treasury: &Address,
    ) -> StakingResult<()> {
        tx.pay(treasury, record.native_balance).await?;
        tx.slash_participant(&record.node).await
    }

    /// Unwind `tx` and pick the error to surface.
    async fn abort(
        &self,
        tx: CustodyTransaction<'_, C, P, S, T>,
        operation: Operation,
        node: &Address,
        cause: StakingError,
    ) -> StakingError {
        warn!("[qc-18] {} for {} aborted: {}", operation, node, cause);
        match tx.rollback().await {
            Ok(()) => cause,
            Err(StakingError::CompensationFailed {
                collaborator,
                reason,
            }) => StakingError::CompensationFailed {
                collaborator,
                reason: format!("{reason}; aborted by: {cause}"),
            },
            Err(other) => other,
        }
    }

    // =========================================================================
    // EXIT PATHS
    // =========================================================================

    async fn withdraw(&self, plan: ExitPlan, operation: Operation) -> StakingResult<StakingRecord> {
        let ExitPlan { guard, record, .. } = plan;
        let node = record.node;

        let mut tx = self.custody.begin();
        let effects = self.withdrawal_effects(&mut tx, &record).await;
        if let Err(cause) = effects {
            return Err(self.abort(tx, operation, &node, cause).await);
        }
        tx.commit();

        let returned = record.native_balance;
        guard.commit(|state| {
            state.store.remove(&node);
            state.registry.remove(&node);
            state.totals.record_returned(returned);
            self.publish(StakingEvent::unstaked(&record));
        });

        info!(
            "[qc-18] {} {}: returned {} native, released {} credits",
            operation, node, record.native_balance, record.credits_balance
        );
        Ok(record)
    }
}

#[async_trait]
impl<C, P, S, T, K> StakingApi for StakingService<C, P, S, T, K>
where
    C: CreditsService + 'static,
    P: PayoutResolver + 'static,
    S: SlashingCollaborator + 'static,
    T: ValueTransfer + 'static,
    K: Clock + 'static,
{
    async fn stake(
        &self,
        caller: Address,
        requested_total: Amount,
        payment: Amount,
    ) -> StakingResult<StakingRecord> {
        let StakePlan { guard, record } = self.plan_stake(caller, requested_total)?;

        let current_total = record.total_stake()?;
        let available = if requested_total > current_total {
            self.custody.available_credits(&caller).await?
        } else {
            Amount::zero()
        };

        let adjustment = reconcile(
            record.native_balance,
            record.credits_balance,
            requested_total,
            available,
        )?;
        verify_payment(&adjustment, payment)?;
        let (native_balance, credits_balance) =
            adjustment.apply_to(record.native_balance, record.credits_balance)?;

        let mut tx = self.custody.begin();
        let effects = self
            .adjustment_effects(&mut tx, &caller, &adjustment)
            .await;
        if let Err(cause) = effects {
            return Err(self.abort(tx, Operation::Stake, &caller, cause).await);
        }
        tx.commit();

        let returned = match adjustment {
            StakeAdjustment::Decrease {
                native_to_return, ..
            } => native_to_return,
            _ => Amount::zero(),
        };
        let staged = StakingRecord {
            native_balance,
            credits_balance,
            status: NodeStatus::Staked,
            unstake_requested_at: None,
            ..record
        };

        let committed = guard.commit(|state| {
            state.registry.insert(caller);
            state.store.put(staged.clone());
            state.totals.record_accepted(payment);
            state.totals.record_returned(returned);
            self.publish(StakingEvent::staked(&staged));
            staged
        });

        info!(
            "[qc-18] Staked {}: native {}, credits {}",
            caller, committed.native_balance, committed.credits_balance
        );
        Ok(committed)
    }

    async fn request_unstake(&self, caller: Address) -> StakingResult<StakingRecord> {
        let record = self.apply_unstake_request(caller)?;
        let requested_at = record.unstake_requested_at.unwrap_or_default();

        info!("[qc-18] Unstake requested by {} at {}", caller, requested_at);
        Ok(record)
    }

    async fn force_unstake(&self, caller: Address) -> StakingResult<StakingRecord> {
        let plan = self.plan_exit(caller, caller, Operation::ForceUnstake)?;
        self.withdraw(plan, Operation::ForceUnstake).await
    }

    async fn admin_unstake(&self, caller: Address, node: Address) -> StakingResult<StakingRecord> {
        let plan = self.plan_exit(caller, node, Operation::AdminUnstake)?;
        self.withdraw(plan, Operation::AdminUnstake).await
    }

    async fn slash(&self, caller: Address, node: Address) -> StakingResult<StakingRecord> {
        let ExitPlan {
            guard,
            record,
            treasury,
        } = self.plan_exit(caller, node, Operation::Slash)?;

        let mut tx = self.custody.begin();
        let effects = self.slash_effects(&mut tx, &record, &treasury).await;
        if let Err(cause) = effects {
            return Err(self.abort(tx, Operation::Slash, &node, cause).await);
        }
        tx.commit();

        let forfeited = record.native_balance;
        guard.commit(|state| {
            state.store.remove(&node);
            state.registry.remove(&node);
            state.totals.record_forfeited(forfeited);
            self.publish(StakingEvent::slashed(&record));
        });

        warn!(
            "[qc-18] Slashed {}: forfeited {} native to treasury, {} credits delegated",
            node, record.native_balance, record.credits_balance
        );
        Ok(record)
    }

    async fn get_staking_info(&self, node: Address) -> StakingRecord {
        self.state.read().staking_info(&node)
    }

    async fn get_all_participants(&self) -> Vec<Address> {
        self.state.read().registry.to_vec()
    }

    async fn get_minimum_stake(&self) -> Amount {
        self.state.read().config.minimum_stake
    }

    async fn get_force_unstake_delay(&self) -> u64 {
        self.state.read().config.force_unstake_delay_secs
    }

    async fn get_administrator(&self) -> Option<Address> {
        self.state.read().config.administrator
    }

    async fn get_owner(&self) -> Address {
        self.state.read().config.owner
    }

    async fn set_administrator(
        &self,
        caller: Address,
        administrator: Address,
    ) -> StakingResult<()> {
        let previous = {
            let mut state = self.state.write();
            state.ensure_owner(&caller)?;
            validate_administrator(&state.config.owner, &administrator)?;
            let previous = state.config.administrator.replace(administrator);
            self.publish(StakingEvent::AdministratorChanged {
                previous,
                current: administrator,
            });
            previous
        };

        info!(
            "[qc-18] Administrator {:?} -> {}",
            previous, administrator
        );
        Ok(())
    }

    async fn set_minimum_stake(&self, caller: Address, amount: Amount) -> StakingResult<()> {
        let previous = {
            let mut state = self.state.write();
            state.ensure_owner(&caller)?;
            let previous = std::mem::replace(&mut state.config.minimum_stake, amount);
            self.publish(StakingEvent::MinimumStakeChanged {
                previous,
                current: amount,
            });
            previous
        };

        info!("[qc-18] Minimum stake {} -> {}", previous, amount);
        Ok(())
    }

    async fn set_force_unstake_delay(&self, caller: Address, delay_secs: u64) -> StakingResult<()> {
        let previous_secs = {
            let mut state = self.state.write();
            state.ensure_owner(&caller)?;
            let previous_secs =
                std::mem::replace(&mut state.config.force_unstake_delay_secs, delay_secs);
            self.publish(StakingEvent::ForceUnstakeDelayChanged {
                previous_secs,
                current_secs: delay_secs,
            });
            previous_secs
        };

        info!(
            "[qc-18] Force-unstake delay {}s -> {}s",
            previous_secs, delay_secs
        );
        Ok(())
    }
}
