use quarry_protocol_core::{ClientboundKind as C, PacketDirection, RegistryBuilder, ServerboundKind as S};

pub(super) fn play(b: &mut RegistryBuilder) {
    b.register(S::TeleportConfirm)
        .register(S::TabComplete)
        .register(S::ChatMessage)
        .register(S::ClientStatus)
        .register(S::ClientSettings)
        .register(S::WindowConfirmation)
        .register(S::ClickWindowButton)
        .register(S::ClickWindow)
        .register(S::CloseWindow)
        .register(S::PluginMessage)
        .register(S::InteractEntity)
        .register(S::KeepAlive)
        .register(S::PlayerPosition)
        .register(S::PlayerPositionAndRotation)
        .register(S::PlayerRotation)
        .advance(PacketDirection::Serverbound)
        .register(S::VehicleMove)
        .register(S::SteerBoat)
        .register(S::PlayerAbilities)
        .register(S::PlayerDigging)
        .register(S::EntityAction)
        .register(S::SteerVehicle)
        .register(S::ResourcePackStatus)
        .register(S::HeldItemChange)
        .register(S::CreativeInventoryAction)
        .register(S::UpdateSign)
        .register(S::Animation)
        .register(S::Spectate)
        .register(S::PlayerBlockPlacement)
        .register(S::UseItem);

    b.register(C::SpawnEntity)
        .register(C::SpawnExperienceOrb)
        .register(C::SpawnWeatherEntity)
        .register(C::SpawnMob)
        .register(C::SpawnPainting)
        .register(C::SpawnPlayer)
        .register(C::EntityAnimation)
        .register(C::Statistics)
        .register(C::BlockBreakAnimation)
        .register(C::BlockEntityData)
        .register(C::BlockAction)
        .register(C::BlockChange)
        .register(C::BossBar)
        .register(C::ServerDifficulty)
        .register(C::TabComplete)
        .register(C::ChatMessage)
        .register(C::MultiBlockChange)
        .register(C::WindowConfirmation)
        .register(C::CloseWindow)
        .register(C::OpenWindow)
        .register(C::WindowItems)
        .register(C::WindowProperty)
        .register(C::SetSlot)
        .register(C::SetCooldown)
        .register(C::PluginMessage)
        .register(C::NamedSoundEffect)
        .register(C::Disconnect)
        .register(C::EntityStatus)
        .register(C::Explosion)
        .register(C::UnloadChunk)
        .register(C::ChangeGameState)
        .register(C::KeepAlive)
        .register(C::ChunkData)
        .register(C::Effect)
        .register(C::Particle)
        .register(C::JoinGame)
        .register(C::MapData)
        .register(C::EntityMovement)
        .register(C::EntityMovementAndRotation)
        .register(C::EntityRotation)
        .advance(PacketDirection::Clientbound)
        .register(C::VehicleMovement)
        .register(C::OpenSignEditor)
        .register(C::PlayerAbilities)
        .register(C::CombatEvent)
        .register(C::PlayerInfo)
        .register(C::PlayerPositionAndRotation)
        .register(C::UseBed)
        .register(C::DestroyEntities)
        .register(C::RemoveEntityEffect)
        .register(C::ResourcePackSend)
        .register(C::Respawn)
        .register(C::EntityHeadRotation)
        .register(C::WorldBorder)
        .register(C::Camera)
        .register(C::HeldItemChange)
        .register(C::DisplayScoreboard)
        .register(C::EntityMetadata)
        .register(C::AttachEntity)
        .register(C::EntityVelocity)
        .register(C::EntityEquipment)
        .register(C::SetExperience)
        .register(C::UpdateHealth)
        .register(C::ScoreboardObjective)
        .register(C::SetPassengers)
        .register(C::Teams)
        .register(C::UpdateScore)
        .register(C::SpawnPosition)
        .register(C::TimeUpdate)
        .register(C::Title)
        .register(C::SoundEffect)
        .register(C::ListHeaderAndFooter)
        .register(C::CollectItem)
        .register(C::EntityTeleport)
        .register(C::EntityProperties)
        .register(C::EntityEffect);
}
