use super::{apply_jmp, build_context, gate, report_error, Services};
use crate::{
    context::Context,
    err::handle_result,
    state::{State, StateHolder},
    widget::Widget,
    BACK_NAME, ERROR,
};
use log::error;
use teloxide::{
    prelude::{Requester as _, ResponseResult},
    types::CallbackQuery,
    Bot,
};

pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    services: Services,
    system_handler: impl Fn() -> Widget,
) -> ResponseResult<()> {
    let chat_id = if let Some(original_message) = &q.message {
        original_message.chat().id
    } else {
        return Ok(());
    };

    let (mut ctx, widget) = match build_context(bot, &services, &q.from, chat_id).await {
        Ok(ctx) => ctx,
        Err((err, bot)) => {
            error!("Failed to build context: {:#}", err);
            bot.send_message(chat_id, ERROR).await?;
            return Ok(());
        }
    };

    let data = q.data.clone().unwrap_or_default();
    if let Err(err) =
        inner_callback_handler(&mut ctx, widget, &data, &services.state, system_handler).await
    {
        report_error(&mut ctx, err).await;
    }
    ctx.bot.answer_callback_query(q.id).await?;
    Ok(())
}

async fn inner_callback_handler(
    ctx: &mut Context,
    widget: Option<Widget>,
    data: &str,
    state_holder: &StateHolder,
    system_handler: impl Fn() -> Widget,
) -> Result<(), eyre::Error> {
    let mut widget = widget.unwrap_or_else(&system_handler);

    // System buttons carry plain commands instead of typed calldata.
    let widget = if data.starts_with('/') {
        match data {
            BACK_NAME => widget.take_back().unwrap_or_else(&system_handler),
            _ => system_handler(),
        }
    } else {
        widget
    };

    let mut widget = gate(ctx, widget, &system_handler).await;
    let result = widget.handle_callback(ctx, data).await;
    let jmp = handle_result(ctx, result).await?;

    let new_widget = apply_jmp(widget, jmp, &system_handler);
    let mut new_widget = gate(ctx, new_widget, &system_handler).await;
    ctx.set_system_go_back(new_widget.can_go_back());
    new_widget.show(ctx).await?;

    state_holder.set_state(
        ctx.chat_id(),
        State {
            view: Some(new_widget),
            origin: Some(ctx.origin().clone()),
        },
    );
    Ok(())
}
