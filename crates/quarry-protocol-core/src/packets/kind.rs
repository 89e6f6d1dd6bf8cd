use crate::state::ConnectionState;

/// Which side sends a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PacketDirection {
    /// Server to client.
    Clientbound,
    /// Client to server.
    Serverbound,
}

macro_rules! packet_kinds {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($state:ident => [$($kind:ident),* $(,)?]),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($($kind,)*)*
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($($name::$kind,)*)*];

            /// The connection state whose id space this packet lives in.
            pub fn state(self) -> ConnectionState {
                match self {
                    $($($name::$kind)|* => ConnectionState::$state,)*
                }
            }
        }
    };
}

packet_kinds! {
    /// Semantic identity of a server-to-client packet, independent of its wire id.
    ClientboundKind {
        Status => [StatusResponse, StatusPong],
        Login => [
            LoginDisconnect,
            EncryptionRequest,
            LoginSuccess,
            LoginSetCompression,
            LoginPluginRequest,
        ],
        Play => [
            SpawnEntity,
            SpawnExperienceOrb,
            SpawnWeatherEntity,
            SpawnMob,
            SpawnPainting,
            SpawnPlayer,
            EntityAnimation,
            Statistics,
            AcknowledgePlayerDigging,
            BlockBreakAnimation,
            BlockEntityData,
            BlockAction,
            BlockChange,
            BossBar,
            ServerDifficulty,
            ChatMessage,
            MultiBlockChange,
            TabComplete,
            DeclareCommands,
            WindowConfirmation,
            CloseWindow,
            OpenWindow,
            WindowItems,
            WindowProperty,
            SetSlot,
            SetCooldown,
            PluginMessage,
            NamedSoundEffect,
            Disconnect,
            EntityStatus,
            Explosion,
            UnloadChunk,
            ChangeGameState,
            OpenHorseWindow,
            KeepAlive,
            ChunkData,
            ChunkBulk,
            Effect,
            Particle,
            UpdateLight,
            JoinGame,
            MapData,
            TradeList,
            EntityMovement,
            EntityMovementAndRotation,
            EntityRotation,
            VehicleMovement,
            OpenBook,
            OpenSignEditor,
            CraftRecipeResponse,
            PlayerAbilities,
            CombatEvent,
            PlayerInfo,
            FacePlayer,
            PlayerPositionAndRotation,
            UseBed,
            UnlockRecipes,
            DestroyEntities,
            RemoveEntityEffect,
            ResourcePackSend,
            Respawn,
            EntityHeadRotation,
            SelectAdvancementTab,
            WorldBorder,
            Camera,
            HeldItemChange,
            UpdateViewPosition,
            UpdateViewDistance,
            SpawnPosition,
            DisplayScoreboard,
            EntityMetadata,
            AttachEntity,
            EntityVelocity,
            EntityEquipment,
            SetExperience,
            UpdateHealth,
            ScoreboardObjective,
            SetPassengers,
            Teams,
            UpdateScore,
            TimeUpdate,
            Title,
            EntitySoundEffect,
            SoundEffect,
            StopSound,
            ListHeaderAndFooter,
            NbtQueryResponse,
            CollectItem,
            EntityTeleport,
            Advancements,
            EntityProperties,
            EntityEffect,
            DeclareRecipes,
            Tags,
            SetCompression,
            UpdateEntityNbt,
            UpdateSign,
        ],
    }
}

packet_kinds! {
    /// Semantic identity of a client-to-server packet, independent of its wire id.
    ServerboundKind {
        Handshaking => [Handshake],
        Status => [StatusRequest, StatusPing],
        Login => [LoginStart, EncryptionResponse, LoginPluginResponse],
        Play => [
            TeleportConfirm,
            QueryBlockNbt,
            SetDifficulty,
            ChatMessage,
            ClientStatus,
            ClientSettings,
            TabComplete,
            WindowConfirmation,
            ClickWindowButton,
            ClickWindow,
            CloseWindow,
            PluginMessage,
            EditBook,
            QueryEntityNbt,
            InteractEntity,
            GenerateStructure,
            KeepAlive,
            LockDifficulty,
            PlayerPosition,
            PlayerPositionAndRotation,
            PlayerRotation,
            VehicleMove,
            SteerBoat,
            PickItem,
            CraftRecipeRequest,
            PlayerAbilities,
            PlayerDigging,
            EntityAction,
            SteerVehicle,
            RecipeBookData,
            NameItem,
            ResourcePackStatus,
            AdvancementTab,
            SelectTrade,
            SetBeaconEffect,
            HeldItemChange,
            UpdateCommandBlock,
            UpdateCommandBlockMinecart,
            CreativeInventoryAction,
            UpdateJigsawBlock,
            UpdateStructureBlock,
            UpdateSign,
            Animation,
            Spectate,
            PlayerBlockPlacement,
            UseItem,
        ],
    }
}

/// A packet kind of either direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PacketKind {
    Clientbound(ClientboundKind),
    Serverbound(ServerboundKind),
}

impl PacketKind {
    pub fn direction(self) -> PacketDirection {
        match self {
            PacketKind::Clientbound(_) => PacketDirection::Clientbound,
            PacketKind::Serverbound(_) => PacketDirection::Serverbound,
        }
    }

    pub fn state(self) -> ConnectionState {
        match self {
            PacketKind::Clientbound(kind) => kind.state(),
            PacketKind::Serverbound(kind) => kind.state(),
        }
    }
}

impl From<ClientboundKind> for PacketKind {
    fn from(kind: ClientboundKind) -> Self {
        PacketKind::Clientbound(kind)
    }
}

impl From<ServerboundKind> for PacketKind {
    fn from(kind: ServerboundKind) -> Self {
        PacketKind::Serverbound(kind)
    }
}
