use quarry_protocol_core::{ClientboundKind as C, PacketDirection, RegistryBuilder, ServerboundKind as S};

pub(super) fn play(b: &mut RegistryBuilder) {
    b.register(S::TeleportConfirm)
        .register(S::QueryBlockNbt)
        .register(S::SetDifficulty)
        .register(S::ChatMessage)
        .register(S::ClientStatus)
        .register(S::ClientSettings)
        .register(S::TabComplete)
        .register(S::WindowConfirmation)
        .register(S::ClickWindowButton)
        .register(S::ClickWindow)
        .register(S::CloseWindow)
        .register(S::PluginMessage)
        .register(S::EditBook)
        .register(S::QueryEntityNbt)
        .register(S::InteractEntity)
        .register(S::KeepAlive)
        .register(S::LockDifficulty)
        .register(S::PlayerPosition)
        .register(S::PlayerPositionAndRotation)
        .register(S::PlayerRotation)
        .advance(PacketDirection::Serverbound)
        .register(S::VehicleMove)
        .register(S::SteerBoat)
        .register(S::PickItem)
        .register(S::CraftRecipeRequest)
        .register(S::PlayerAbilities)
        .register(S::PlayerDigging)
        .register(S::EntityAction)
        .register(S::SteerVehicle)
        .register(S::RecipeBookData)
        .register(S::NameItem)
        .register(S::ResourcePackStatus)
        .register(S::AdvancementTab)
        .register(S::SelectTrade)
        .register(S::SetBeaconEffect)
        .register(S::HeldItemChange)
        .register(S::UpdateCommandBlock)
        .register(S::UpdateCommandBlockMinecart)
        .register(S::CreativeInventoryAction)
        .register(S::UpdateJigsawBlock)
        .register(S::UpdateStructureBlock)
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
        .register(C::ChatMessage)
        .register(C::MultiBlockChange)
        .register(C::TabComplete)
        .register(C::DeclareCommands)
        .register(C::WindowConfirmation)
        .register(C::CloseWindow)
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
        .register(C::OpenHorseWindow)
        .register(C::KeepAlive)
        .register(C::ChunkData)
        .register(C::Effect)
        .register(C::Particle)
        .register(C::UpdateLight)
        .register(C::JoinGame)
        .register(C::MapData)
        .register(C::TradeList)
        .register(C::EntityMovement)
        .register(C::EntityMovementAndRotation)
        .register(C::EntityRotation)
        .advance(PacketDirection::Clientbound)
        .register(C::VehicleMovement)
        .register(C::OpenBook)
        .register(C::OpenWindow)
        .register(C::OpenSignEditor)
        .register(C::CraftRecipeResponse)
        .register(C::PlayerAbilities)
        .register(C::CombatEvent)
        .register(C::PlayerInfo)
        .register(C::FacePlayer)
        .register(C::PlayerPositionAndRotation)
        .register(C::UnlockRecipes)
        .register(C::DestroyEntities)
        .register(C::RemoveEntityEffect)
        .register(C::ResourcePackSend)
        .register(C::Respawn)
        .register(C::EntityHeadRotation)
        .register(C::SelectAdvancementTab)
        .register(C::WorldBorder)
        .register(C::Camera)
        .register(C::HeldItemChange)
        .register(C::UpdateViewPosition)
        .register(C::UpdateViewDistance)
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
        .register(C::EntitySoundEffect)
        .register(C::SoundEffect)
        .register(C::StopSound)
        .register(C::ListHeaderAndFooter)
        .register(C::NbtQueryResponse)
        .register(C::CollectItem)
        .register(C::EntityTeleport)
        .register(C::Advancements)
        .register(C::EntityProperties)
        .register(C::EntityEffect)
        .register(C::DeclareRecipes)
        .register(C::Tags)
        .register(C::AcknowledgePlayerDigging);
}
