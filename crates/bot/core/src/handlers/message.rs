use super::{apply_jmp, build_context, gate, report_error, Services};
use crate::{
    context::Context,
    err::handle_result,
    state::{State, StateHolder},
    widget::{Jmp, Widget},
    ERROR,
};
use log::error;
use teloxide::{
    prelude::{Requester as _, ResponseResult},
    types::Message,
    Bot,
};

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    services: Services,
    system_handler: impl Fn() -> Widget,
) -> ResponseResult<()> {
    if !msg.chat.is_private() {
        return Ok(());
    }
    let from = if let Some(from) = msg.from.as_ref() {
        from
    } else {
        return Ok(());
    };

    let (mut ctx, widget) = match build_context(bot, &services, from, msg.chat.id).await {
        Ok(ctx) => ctx,
        Err((err, bot)) => {
            error!("Failed to build context: {:#}", err);
            bot.send_message(msg.chat.id, ERROR).await?;
            return Ok(());
        }
    };

    if let Err(err) =
        inner_message_handler(&mut ctx, widget, &msg, &services.state, system_handler).await
    {
        report_error(&mut ctx, err).await;
    }
    Ok(())
}

async fn inner_message_handler(
    ctx: &mut Context,
    widget: Option<Widget>,
    msg: &Message,
    state_holder: &StateHolder,
    system_handler: impl Fn() -> Widget,
) -> Result<(), eyre::Error> {
    let widget = widget.unwrap_or_else(&system_handler);
    let mut widget = gate(ctx, widget, &system_handler).await;

    // Commands are answered by the main menu whatever screen is open.
    let mut system = system_handler();
    let (base, jmp) = match system.handle_message(ctx, msg).await? {
        Jmp::None => {
            let result = widget.handle_message(ctx, msg).await;
            (widget, handle_result(ctx, result).await?)
        }
        jmp => (system, jmp),
    };

    let new_widget = apply_jmp(base, jmp, &system_handler);
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
