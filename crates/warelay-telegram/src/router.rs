use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use warelay_core::{domain::IncomingUpdate, relay::InboundRelay};

use crate::convert::incoming_message;

/// Consume message updates for the process lifetime.
///
/// All updates share one distribution key, so the dispatcher hands them to
/// the relay strictly one at a time, in arrival order.
pub async fn run_polling(bot: Bot, relay: Arc<InboundRelay>) {
    let handler = Update::filter_message().endpoint(handle_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![relay])
        .distribution_function(|_| Some(()))
        .build()
        .dispatch()
        .await;
}

async fn handle_message(msg: Message, relay: Arc<InboundRelay>) -> ResponseResult<()> {
    let update = IncomingUpdate {
        message: Some(incoming_message(&msg)),
    };
    // Outcomes are logged by the relay; nothing here may stop the dispatcher.
    let outcome = relay.handle(&update).await;
    tracing::trace!(?outcome, "update processed");
    Ok(())
}
