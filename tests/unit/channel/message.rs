use super::*;
use serde_json::json;

#[test]
fn inbound_channels_are_listed() {
    let msgs = [
        Inbound::RequestFitToWindow,
        Inbound::CancelBatch,
        Inbound::NextBatchStep,
        Inbound::LayerRemoved(0),
        Inbound::SaveBatch(vec![]),
        Inbound::Export(String::new()),
    ];
    for m in msgs {
        assert!(INBOUND_CHANNELS.contains(&m.channel()), "{}", m.channel());
    }
}

#[test]
fn integral_params_are_rounded() {
    let c = ParamChange::number(2, LayerParam::FacesX, 11.6);
    assert_eq!(c.value, json!(12));
    let c = ParamChange::number(0, LayerParam::LightSpeed, 539.4);
    assert_eq!(c.value, json!(539));
    let c = ParamChange::number(0, LayerParam::Vignette, 0.25);
    assert_eq!(c.value, json!(0.25));
    let c = ParamChange::number(0, LayerParam::MirrorOn, 1.0);
    assert_eq!(c.value, Value::Null);
}

#[test]
fn param_messages_use_param_channels() {
    let m = Outbound::Param(ParamChange::text(1, LayerParam::RenderMode, "points"));
    assert_eq!(m.channel(), "changeFssRenderMode");
    let m = Outbound::Param(ParamChange::toggle(1, LayerParam::TurnOff));
    assert_eq!(m.channel(), "turnOff");
    assert_eq!(Outbound::Pause.channel(), "pause");
}
