//! Composable multicall batches with post-processing and completion callbacks.
//!
//! A builder accumulates calls, optionally a transform over the raw reply, and optionally a
//! completion callback. Sending consumes the builder, so a dispatched batch cannot grow.

use flotilla_torrent_core::{TorrentError, TorrentResult};
use tracing::debug;

use crate::transport::{MethodCall, RpcTransport};
use crate::xmlrpc::Value;

type Transform<T> = Box<dyn FnOnce(Vec<Value>) -> TorrentResult<T> + Send>;
type Completion<T> = Box<dyn FnOnce(Result<&T, &TorrentError>) + Send>;

/// One outbound batch under construction.
pub struct RequestBuilder<T = Vec<Value>> {
    calls: Vec<MethodCall>,
    transform: Transform<T>,
    completion: Option<Completion<T>>,
}

impl RequestBuilder<Vec<Value>> {
    /// Start an empty batch whose result is the raw per-call values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            transform: Box::new(Ok::<Vec<Value>, TorrentError>),
            completion: None,
        }
    }
}

impl Default for RequestBuilder<Vec<Value>> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> RequestBuilder<T> {
    /// Append one call; order is preserved on the wire.
    #[must_use]
    pub fn add_call(mut self, call: MethodCall) -> Self {
        self.calls.push(call);
        self
    }

    /// Append several calls in order.
    #[must_use]
    pub fn add_calls(mut self, calls: impl IntoIterator<Item = MethodCall>) -> Self {
        self.calls.extend(calls);
        self
    }

    /// Register the transform applied to the raw reply before completion.
    ///
    /// Replaces any earlier transform. A completion callback registered before this call is
    /// discarded because its result type no longer applies; register transforms first.
    #[must_use]
    pub fn post_process<U, F>(self, transform: F) -> RequestBuilder<U>
    where
        F: FnOnce(Vec<Value>) -> TorrentResult<U> + Send + 'static,
    {
        RequestBuilder {
            calls: self.calls,
            transform: Box::new(transform),
            completion: None,
        }
    }

    /// Register the completion callback, replacing any earlier one.
    #[must_use]
    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(Result<&T, &TorrentError>) + Send + 'static,
    {
        self.completion = Some(Box::new(callback));
        self
    }

    /// Calls queued so far.
    #[must_use]
    pub fn calls(&self) -> &[MethodCall] {
        &self.calls
    }

    /// Dispatch the batch, apply the transform, fire the callback, and return the result.
    ///
    /// Any per-call fault turns the whole batch into a protocol error that lists every fault
    /// with its call index and method name, alongside the results of the calls that succeeded.
    /// The transform is skipped in that case.
    ///
    /// # Errors
    ///
    /// Returns the transport, protocol, or validation error of the round-trip, or the error
    /// produced by the transform.
    pub async fn send(self, transport: &dyn RpcTransport) -> TorrentResult<T> {
        let Self {
            calls,
            transform,
            completion,
        } = self;
        let result = dispatch(&calls, transport).await.and_then(transform);
        if let Some(callback) = completion {
            callback(result.as_ref());
        }
        result
    }
}

async fn dispatch(calls: &[MethodCall], transport: &dyn RpcTransport) -> TorrentResult<Vec<Value>> {
    if calls.is_empty() {
        return Err(TorrentError::validation("calls", "empty"));
    }
    debug!(
        methods = ?calls.iter().map(|call| call.method.as_str()).collect::<Vec<_>>(),
        "sending batch"
    );
    let outcomes = transport.send(calls).await?;
    let mut values = Vec::with_capacity(outcomes.len());
    let mut faults = Vec::new();
    for (index, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(value) => values.push(value),
            Err(mut fault) => {
                fault.index = Some(index);
                fault.method = calls.get(index).map(|call| call.method.clone());
                faults.push(fault);
            }
        }
    }
    if faults.is_empty() {
        Ok(values)
    } else {
        Err(TorrentError::Protocol {
            faults,
            completed: values.into_iter().map(Value::into_json).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use flotilla_torrent_core::{CallFault, TransportFailure};

    use super::*;
    use crate::transport::CallOutcome;

    struct ScriptedTransport {
        reply: Mutex<Option<TorrentResult<Vec<CallOutcome>>>>,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new(reply: TorrentResult<Vec<CallOutcome>>) -> Self {
            Self {
                reply: Mutex::new(Some(reply)),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RpcTransport for ScriptedTransport {
        async fn send(&self, calls: &[MethodCall]) -> TorrentResult<Vec<CallOutcome>> {
            self.seen
                .lock()
                .expect("seen lock")
                .extend(calls.iter().map(|call| call.method.clone()));
            self.reply
                .lock()
                .expect("reply lock")
                .take()
                .expect("one scripted reply")
        }
    }

    #[tokio::test]
    async fn raw_reply_passes_through_without_transform() -> anyhow::Result<()> {
        let transport = ScriptedTransport::new(Ok(vec![Ok(Value::Int(0)), Ok(Value::Int(0))]));
        let values = RequestBuilder::new()
            .add_call(MethodCall::new("d.stop").arg("ABC"))
            .add_call(MethodCall::new("d.close").arg("ABC"))
            .send(&transport)
            .await?;
        assert_eq!(values, vec![Value::Int(0), Value::Int(0)]);
        assert_eq!(
            *transport.seen.lock().expect("seen lock"),
            vec!["d.stop".to_string(), "d.close".to_string()]
        );
        Ok(())
    }

    #[tokio::test]
    async fn transform_runs_before_completion() -> anyhow::Result<()> {
        let transport = ScriptedTransport::new(Ok(vec![Ok(Value::from("0.9.8"))]));
        let observed = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&observed);
        let version = RequestBuilder::new()
            .add_call(MethodCall::new("system.client_version"))
            .post_process(|mut values| {
                values
                    .pop()
                    .and_then(|value| value.as_str().map(str::to_string))
                    .ok_or(TorrentError::validation("reply", "missing version"))
            })
            .on_complete(|_| {})
            .on_complete(move |result| {
                *sink.lock().expect("sink lock") = result.ok().cloned();
            })
            .send(&transport)
            .await?;
        assert_eq!(version, "0.9.8");
        assert_eq!(
            observed.lock().expect("observed lock").as_deref(),
            Some("0.9.8")
        );
        Ok(())
    }

    #[tokio::test]
    async fn partial_faults_become_protocol_errors_with_context() {
        let transport = ScriptedTransport::new(Ok(vec![
            Ok(Value::Int(0)),
            Err(CallFault {
                index: Some(1),
                method: None,
                code: -501,
                message: "Could not find info-hash.".into(),
            }),
        ]));
        let called = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&called);
        let err = RequestBuilder::new()
            .add_call(MethodCall::new("d.stop").arg("ABC"))
            .add_call(MethodCall::new("d.start").arg("MISSING"))
            .on_complete(move |result| {
                assert!(result.is_err());
                *flag.lock().expect("flag lock") = true;
            })
            .send(&transport)
            .await
            .expect_err("fault expected");
        match err {
            TorrentError::Protocol { faults, completed } => {
                assert_eq!(faults.len(), 1);
                assert_eq!(faults[0].index, Some(1));
                assert_eq!(faults[0].method.as_deref(), Some("d.start"));
                assert_eq!(completed, vec![serde_json::Value::from(0)]);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(*called.lock().expect("called lock"));
    }

    #[tokio::test]
    async fn transport_errors_reach_the_callback() {
        let transport = ScriptedTransport::new(Err(TorrentError::transport(
            TransportFailure::Timeout,
            std::io::Error::other("slow"),
        )));
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let result = RequestBuilder::new()
            .add_call(MethodCall::new("d.multicall2"))
            .on_complete(move |result| {
                *sink.lock().expect("sink lock") = result.err().and_then(TorrentError::transport_kind);
            })
            .send(&transport)
            .await;
        assert!(result.is_err());
        assert_eq!(
            *seen.lock().expect("seen lock"),
            Some(TransportFailure::Timeout)
        );
    }

    #[tokio::test]
    async fn empty_builder_is_rejected() {
        let transport = ScriptedTransport::new(Ok(Vec::new()));
        let err = RequestBuilder::new()
            .send(&transport)
            .await
            .expect_err("empty batch");
        assert!(matches!(err, TorrentError::Validation { field: "calls", .. }));
        assert!(transport.seen.lock().expect("seen lock").is_empty());
    }
}
