//! Directive scripts, one per packet-table change point. Each script lists
//! Play packets in wire order; versions between two change points replay the
//! lower script.

mod v110;
mod v47;
mod v498;
mod v735;

use quarry_protocol_core::version::{V1_13, V1_14_4, V1_16, V1_8, V1_9_4};
use quarry_protocol_core::{
    ClientboundKind, PacketRegistry, ProtocolVersion, RegistryBuilder, RegistryError,
    ServerboundKind, VersionedValue,
};

type Script = fn(&mut RegistryBuilder);

fn play_scripts() -> VersionedValue<Script> {
    VersionedValue::with_breakpoints(
        v47::play as Script,
        [
            (V1_8, v47::play as Script),
            (V1_9_4, v110::play as Script),
            (V1_14_4, v498::play as Script),
            (V1_16, v735::play as Script),
        ],
    )
}

/// Replay the scripts in effect for `version`.
pub fn build_registry(version: ProtocolVersion) -> Result<PacketRegistry, RegistryError> {
    let mut builder = PacketRegistry::builder(version);
    handshake_status_login(&mut builder, version.protocol());
    let play = *play_scripts().get(version);
    play(&mut builder);
    builder.build()
}

/// Pre-play id spaces, shared by every version.
fn handshake_status_login(b: &mut RegistryBuilder, protocol: u32) {
    b.register(ServerboundKind::Handshake);

    b.register(ClientboundKind::StatusResponse)
        .register(ClientboundKind::StatusPong)
        .register(ServerboundKind::StatusRequest)
        .register(ServerboundKind::StatusPing);

    b.register(ClientboundKind::LoginDisconnect)
        .register(ClientboundKind::EncryptionRequest)
        .register(ClientboundKind::LoginSuccess)
        .register(ClientboundKind::LoginSetCompression)
        .register(ServerboundKind::LoginStart)
        .register(ServerboundKind::EncryptionResponse);

    if protocol >= V1_13 {
        b.register(ClientboundKind::LoginPluginRequest)
            .register(ServerboundKind::LoginPluginResponse);
    }
}
