//! Pending-call table
//!
//! Tracks outbound calls awaiting a result. Each entry is removed by
//! exactly one of: a matching result, its timer firing, a send failure or
//! endpoint close. Whichever removes the entry settles the call; every later
//! attempt finds nothing and does nothing.

use crate::CallError;
use codec::Value;
use core_types::CorrelationId;
use ipc::ErrorDescriptor;
use std::collections::HashMap;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Outcome delivered to a waiting caller
pub type CallOutcome = Result<Value, CallError>;

struct PendingCall {
    function: String,
    started: Instant,
    timer: Option<JoinHandle<()>>,
    settle: oneshot::Sender<CallOutcome>,
}

impl PendingCall {
    fn finish(self, outcome: CallOutcome) {
        // The caller may have stopped waiting; nothing to do then.
        let _ = self.settle.send(outcome);
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

pub struct PendingCalls {
    calls: HashMap<CorrelationId, PendingCall>,
    limit: Option<usize>,
}

impl PendingCalls {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            calls: HashMap::new(),
            limit,
        }
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn contains(&self, id: &CorrelationId) -> bool {
        self.calls.contains_key(id)
    }

    /// Registers a call and returns the receiver its outcome arrives on
    pub fn insert(
        &mut self,
        id: CorrelationId,
        function: impl Into<String>,
    ) -> Result<oneshot::Receiver<CallOutcome>, CallError> {
        if let Some(limit) = self.limit {
            if self.calls.len() >= limit {
                return Err(CallError::TooManyPending { limit });
            }
        }

        let (settle, receiver) = oneshot::channel();
        self.calls.insert(
            id,
            PendingCall {
                function: function.into(),
                started: Instant::now(),
                timer: None,
                settle,
            },
        );
        Ok(receiver)
    }

    /// Attaches the timeout timer to a registered call
    ///
    /// If the call already settled the timer is aborted immediately.
    pub fn arm_timer(&mut self, id: &CorrelationId, timer: JoinHandle<()>) {
        match self.calls.get_mut(id) {
            Some(call) => call.timer = Some(timer),
            None => timer.abort(),
        }
    }

    /// Settles a call from a received result
    ///
    /// Returns `false` if no call with this id is pending.
    pub fn resolve(&mut self, id: &CorrelationId, outcome: Result<Value, ErrorDescriptor>) -> bool {
        let Some(mut call) = self.calls.remove(id) else {
            return false;
        };
        call.cancel_timer();
        let outcome = outcome.map_err(|error| CallError::Remote {
            function: call.function.clone(),
            error,
        });
        call.finish(outcome);
        true
    }

    /// Settles a call as timed out
    ///
    /// Called from the call's own timer task, so the timer is not aborted.
    pub fn expire(&mut self, id: &CorrelationId) -> Option<CallError> {
        let call = self.calls.remove(id)?;
        let elapsed_ms = call
            .started
            .elapsed()
            .as_millis()
            .try_into()
            .unwrap_or(u64::MAX);
        let function = call.function.clone();
        call.finish(Err(CallError::Timeout {
            function: function.clone(),
            elapsed_ms,
        }));
        Some(CallError::Timeout {
            function,
            elapsed_ms,
        })
    }

    /// Removes a call without settling it
    pub fn discard(&mut self, id: &CorrelationId) -> bool {
        match self.calls.remove(id) {
            Some(mut call) => {
                call.cancel_timer();
                true
            }
            None => false,
        }
    }

    /// Settles every pending call as closed
    pub fn close_all(&mut self) -> usize {
        let count = self.calls.len();
        for (_, mut call) in self.calls.drain() {
            call.cancel_timer();
            let function = call.function.clone();
            call.finish(Err(CallError::Closed { function }));
        }
        count
    }
}
