use quarry_protocol_core::{ClientboundKind as C, PacketDirection, RegistryBuilder, ServerboundKind as S};

pub(super) fn play(b: &mut RegistryBuilder) {
    b.register(S::KeepAlive)
        .register(S::ChatMessage)
        .register(S::InteractEntity)
        // 0x03 is the on-ground only movement packet
        .register_at(S::PlayerPosition, 0x04)
        .register(S::PlayerRotation)
        .register(S::PlayerPositionAndRotation)
        .register(S::PlayerDigging)
        .register(S::PlayerBlockPlacement)
        .register(S::HeldItemChange)
        .register(S::Animation)
        .register(S::EntityAction)
        .register(S::SteerVehicle)
        .register(S::CloseWindow)
        .register(S::ClickWindow)
        .register(S::WindowConfirmation)
        .register(S::CreativeInventoryAction)
        .register(S::ClickWindowButton)
        .register(S::UpdateSign)
        .register(S::PlayerAbilities)
        .register(S::TabComplete)
        .register(S::ClientSettings)
        .register(S::ClientStatus)
        .register(S::PluginMessage)
        .register(S::Spectate)
        .register(S::ResourcePackStatus);

    b.register(C::KeepAlive)
        .register(C::JoinGame)
        .register(C::ChatMessage)
        .register(C::TimeUpdate)
        .register(C::EntityEquipment)
        .register(C::SpawnPosition)
        .register(C::UpdateHealth)
        .register(C::Respawn)
        .register(C::PlayerPositionAndRotation)
        .register(C::HeldItemChange)
        .register(C::UseBed)
        .register(C::EntityAnimation)
        .register(C::SpawnPlayer)
        .register(C::CollectItem)
        .register(C::SpawnEntity)
        .register(C::SpawnMob)
        .register(C::SpawnPainting)
        .register(C::SpawnExperienceOrb)
        .register(C::EntityVelocity)
        .register(C::DestroyEntities)
        .advance(PacketDirection::Clientbound)
        .register(C::EntityMovement)
        .register(C::EntityRotation)
        .register(C::EntityMovementAndRotation)
        .register(C::EntityTeleport)
        .register(C::EntityHeadRotation)
        .register(C::EntityStatus)
        .register(C::AttachEntity)
        .register(C::EntityMetadata)
        .register(C::EntityEffect)
        .register(C::RemoveEntityEffect)
        .register(C::SetExperience)
        .register(C::EntityProperties)
        .register(C::ChunkData)
        .register(C::MultiBlockChange)
        .register(C::BlockChange)
        .register(C::BlockAction)
        .register(C::BlockBreakAnimation)
        .register(C::ChunkBulk)
        .register(C::Explosion)
        .register(C::Effect)
        .register(C::NamedSoundEffect)
        .register(C::Particle)
        .register(C::ChangeGameState)
        .register(C::SpawnWeatherEntity)
        .register(C::OpenWindow)
        .register(C::CloseWindow)
        .register(C::SetSlot)
        .register(C::WindowItems)
        .register(C::WindowProperty)
        .register(C::WindowConfirmation)
        .register(C::UpdateSign)
        .register(C::MapData)
        .register(C::BlockEntityData)
        .register(C::OpenSignEditor)
        .register(C::Statistics)
        .register(C::PlayerInfo)
        .register(C::PlayerAbilities)
        .register(C::TabComplete)
        .register(C::ScoreboardObjective)
        .register(C::UpdateScore)
        .register(C::DisplayScoreboard)
        .register(C::Teams)
        .register(C::PluginMessage)
        .register(C::Disconnect)
        .register(C::ServerDifficulty)
        .register(C::CombatEvent)
        .register(C::Camera)
        .register(C::WorldBorder)
        .register(C::Title)
        .register(C::SetCompression)
        .register(C::ListHeaderAndFooter)
        .register(C::ResourcePackSend)
        .register(C::UpdateEntityNbt);
}
