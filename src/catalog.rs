use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// The school's violation/commendation catalog. Every kind carries a fixed
/// canonical point value; positive values are commendations. The wire form
/// is the official Vietnamese label, so the enum round-trips through the
/// same strings the paper logbook uses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString, EnumIter,
)]
pub enum ViolationKind {
    // Sổ đầu bài
    #[strum(serialize = "Tiết B")]
    PeriodB,
    #[strum(serialize = "Tiết C")]
    PeriodC,
    #[strum(serialize = "Tiết D")]
    PeriodD,
    #[strum(serialize = "Tiết không đánh giá")]
    PeriodUnrated,
    // Sĩ số
    #[strum(serialize = "Không ghi sĩ số")]
    RollCountNotRecorded,
    #[strum(serialize = "Không chốt sĩ số")]
    RollCountNotFinalized,
    #[strum(serialize = "Vắng có phép")]
    ExcusedAbsence,
    #[strum(serialize = "Vắng không phép")]
    UnexcusedAbsence,
    #[strum(serialize = "Trốn tiết")]
    ClassCutting,
    #[strum(serialize = "Đi học trễ")]
    LateArrival,
    // Tác phong
    #[strum(serialize = "Không đồng phục")]
    NoUniform,
    #[strum(serialize = "Tác phong không nghiêm túc")]
    ImproperConduct,
    // Chuyên cần
    #[strum(serialize = "Sinh hoạt 15p không nghiêm túc (HS)")]
    HomeroomDisorderStudent,
    #[strum(serialize = "Sinh hoạt 15p không nghiêm túc (Lớp)")]
    HomeroomDisorderClass,
    #[strum(serialize = "Tập trung chậm (HS)")]
    SlowAssemblyStudent,
    #[strum(serialize = "Tập trung chậm (Lớp)")]
    SlowAssemblyClass,
    #[strum(serialize = "Trốn tập trung")]
    SkippedAssembly,
    #[strum(serialize = "Không dọn ghế")]
    ChairsNotStowed,
    #[strum(serialize = "Vắng lễ/ngoại khóa")]
    MissedCeremony,
    #[strum(serialize = "Đọc truyện/việc riêng")]
    OffTaskInClass,
    #[strum(serialize = "Không đóng cửa/tắt điện")]
    DoorsLightsLeftOn,
    #[strum(serialize = "Vắng họp")]
    MissedMeeting,
    #[strum(serialize = "Chậm trễ họp")]
    LateToMeeting,
    #[strum(serialize = "Gửi xe ngoài trường")]
    OffCampusParking,
    #[strum(serialize = "Để xe sai vị trí (HS)")]
    MisparkedBikeStudent,
    #[strum(serialize = "Để xe sai vị trí (Lớp)")]
    MisparkedBikeClass,
    // Trật tự
    #[strum(serialize = "Ồn ào (HS)")]
    NoisyStudent,
    #[strum(serialize = "Mất trật tự (Lớp)")]
    DisorderlyClass,
    #[strum(serialize = "Vào khu vực cấm")]
    RestrictedArea,
    #[strum(serialize = "Chạy xe trong sân")]
    RidingInYard,
    // Vệ sinh
    #[strum(serialize = "Ăn quà vặt")]
    Snacking,
    #[strum(serialize = "Trực nhật chậm")]
    LateCleaningDuty,
    #[strum(serialize = "Không trực nhật/đổ rác")]
    CleaningDutySkipped,
    #[strum(serialize = "Không lao động")]
    LaborDutySkipped,
    #[strum(serialize = "Không hoàn thành nhiệm vụ trực tuần")]
    WeeklyDutyUnfinished,
    #[strum(serialize = "Thiếu dụng cụ lớp")]
    MissingClassSupplies,
    #[strum(serialize = "Bỏ rác sai quy định")]
    ImproperLittering,
    #[strum(serialize = "Xả rác nơi tập trung")]
    LitteringAssemblyArea,
    #[strum(serialize = "Không bình hoa/khẩu hiệu")]
    MissingFlowersSlogan,
    // Quy định cấm
    #[strum(serialize = "Phá nước uống")]
    DrinkingWaterVandalism,
    #[strum(serialize = "Vẽ bậy")]
    Graffiti,
    #[strum(serialize = "Nhuộm tóc/sơn móng/khuyên tai/xăm")]
    DyedHairPiercingTattoo,
    #[strum(serialize = "Vô lễ GV")]
    DisrespectingTeacher,
    #[strum(serialize = "Ra ngoài trường")]
    LeavingCampus,
    #[strum(serialize = "Đánh nhau/đe dọa/quay phim")]
    FightingThreatFilming,
    #[strum(serialize = "Vi phạm GT")]
    TrafficViolation,
    #[strum(serialize = "Ngồi trên bàn")]
    SittingOnDesk,
    #[strum(serialize = "Ngồi bàn GV/lan can")]
    SittingTeacherDeskRailing,
    #[strum(serialize = "Rượu bia/thuốc lá")]
    AlcoholTobacco,
    #[strum(serialize = "Chất cháy nổ")]
    FlammableMaterials,
    #[strum(serialize = "Văn hóa phẩm không phù hợp")]
    InappropriateMedia,
    #[strum(serialize = "Làm hỏng tài sản")]
    PropertyDamage,
    #[strum(serialize = "Mang tài sản ra ngoài")]
    PropertyRemoval,
    #[strum(serialize = "Gian lận thi cử")]
    ExamCheating,
    #[strum(serialize = "Nói tục/chửi thề")]
    Profanity,
    #[strum(serialize = "Sử dụng điện thoại")]
    PhoneUse,
    // Khen thưởng
    #[strum(serialize = "Nhặt được của rơi")]
    ReturnedLostProperty,
    #[strum(serialize = "Lớp 100% giờ A")]
    AllPeriodsRankA,
    #[strum(serialize = "Báo tin có lợi")]
    HelpfulTip,
    #[strum(serialize = "Duy trì sĩ số tốt")]
    PerfectAttendance,
    #[strum(serialize = "100% tham gia phong trào")]
    FullMovementParticipation,
    #[strum(serialize = "Đạt giải Nhất")]
    FirstPrize,
    #[strum(serialize = "Đạt giải Nhì")]
    SecondPrize,
    #[strum(serialize = "Đạt giải Ba")]
    ThirdPrize,
    #[strum(serialize = "Đạt giải KK")]
    ConsolationPrize,
    #[strum(serialize = "Viết bài đăng báo/fanpage")]
    PublishedArticle,
    #[strum(serialize = "Lao động tình nguyện")]
    VolunteerLabor,
    #[strum(serialize = "Thi online: 100% tham gia")]
    OnlineContestFull,
    #[strum(serialize = "Thi online: 80-100% tham gia")]
    OnlineContestHigh,
    #[strum(serialize = "Thi online: 50-80% tham gia")]
    OnlineContestMid,
    #[strum(serialize = "Thi online: < 50% tham gia")]
    OnlineContestLow,
    // Điểm phát sinh
    #[strum(serialize = "Điểm phát sinh")]
    ManualAdjustment,
}

impl Serialize for ViolationKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_ref())
    }
}

impl<'de> Deserialize<'de> for ViolationKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse()
            .map_err(|_| serde::de::Error::custom(format!("unknown violation type: {raw}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString, EnumIter)]
pub enum ViolationGroup {
    #[strum(serialize = "Sổ đầu bài")]
    Logbook,
    #[strum(serialize = "Sĩ số")]
    RollCall,
    #[strum(serialize = "Tác phong")]
    Conduct,
    #[strum(serialize = "Chuyên cần")]
    Diligence,
    #[strum(serialize = "Trật tự")]
    Order,
    #[strum(serialize = "Vệ sinh")]
    Hygiene,
    #[strum(serialize = "Quy định cấm")]
    ProhibitedActs,
    #[strum(serialize = "Khen thưởng")]
    Commendation,
    #[strum(serialize = "Điểm phát sinh")]
    Adjustment,
}

impl Serialize for ViolationGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_ref())
    }
}

impl ViolationKind {
    /// Canonical point value. Records normally carry this verbatim; manual
    /// adjustments override it.
    pub fn points(self) -> i64 {
        use ViolationKind::*;
        match self {
            PeriodB => -5,
            PeriodC => -10,
            PeriodD => -20,
            PeriodUnrated => -20,
            RollCountNotRecorded => -5,
            RollCountNotFinalized => -5,
            ExcusedAbsence => -2,
            UnexcusedAbsence => -10,
            ClassCutting => -20,
            LateArrival => -5,
            NoUniform => -10,
            ImproperConduct => -5,
            HomeroomDisorderStudent => -5,
            HomeroomDisorderClass => -15,
            SlowAssemblyStudent => -5,
            SlowAssemblyClass => -20,
            SkippedAssembly => -20,
            ChairsNotStowed => -20,
            MissedCeremony => -15,
            OffTaskInClass => -15,
            DoorsLightsLeftOn => -10,
            MissedMeeting => -10,
            LateToMeeting => -5,
            OffCampusParking => -20,
            MisparkedBikeStudent => -5,
            MisparkedBikeClass => -15,
            NoisyStudent => -10,
            DisorderlyClass => -20,
            RestrictedArea => -5,
            RidingInYard => -10,
            Snacking => -5,
            LateCleaningDuty => -10,
            CleaningDutySkipped => -15,
            LaborDutySkipped => -30,
            WeeklyDutyUnfinished => -20,
            MissingClassSupplies => -5,
            ImproperLittering => -10,
            LitteringAssemblyArea => -20,
            MissingFlowersSlogan => -10,
            DrinkingWaterVandalism => -10,
            Graffiti => -20,
            DyedHairPiercingTattoo => -20,
            DisrespectingTeacher => -50,
            LeavingCampus => -20,
            FightingThreatFilming => -50,
            TrafficViolation => -50,
            SittingOnDesk => -10,
            SittingTeacherDeskRailing => -20,
            AlcoholTobacco => -50,
            FlammableMaterials => -40,
            InappropriateMedia => -20,
            PropertyDamage => -30,
            PropertyRemoval => -50,
            ExamCheating => -50,
            Profanity => -20,
            PhoneUse => -20,
            ReturnedLostProperty => 20,
            AllPeriodsRankA => 40,
            HelpfulTip => 10,
            PerfectAttendance => 15,
            FullMovementParticipation => 20,
            FirstPrize => 30,
            SecondPrize => 20,
            ThirdPrize => 10,
            ConsolationPrize => 5,
            PublishedArticle => 30,
            VolunteerLabor => 15,
            OnlineContestFull => 30,
            OnlineContestHigh => 20,
            OnlineContestMid => 15,
            OnlineContestLow => -20,
            ManualAdjustment => 0,
        }
    }

    pub fn group(self) -> ViolationGroup {
        use ViolationKind::*;
        match self {
            PeriodB | PeriodC | PeriodD | PeriodUnrated => ViolationGroup::Logbook,
            RollCountNotRecorded | RollCountNotFinalized | ExcusedAbsence | UnexcusedAbsence
            | ClassCutting | LateArrival => ViolationGroup::RollCall,
            NoUniform | ImproperConduct => ViolationGroup::Conduct,
            HomeroomDisorderStudent | HomeroomDisorderClass | SlowAssemblyStudent
            | SlowAssemblyClass | SkippedAssembly | ChairsNotStowed | MissedCeremony
            | OffTaskInClass | DoorsLightsLeftOn | MissedMeeting | LateToMeeting
            | OffCampusParking | MisparkedBikeStudent | MisparkedBikeClass => {
                ViolationGroup::Diligence
            }
            NoisyStudent | DisorderlyClass | RestrictedArea | RidingInYard => {
                ViolationGroup::Order
            }
            Snacking | LateCleaningDuty | CleaningDutySkipped | LaborDutySkipped
            | WeeklyDutyUnfinished | MissingClassSupplies | ImproperLittering
            | LitteringAssemblyArea | MissingFlowersSlogan => ViolationGroup::Hygiene,
            DrinkingWaterVandalism | Graffiti | DyedHairPiercingTattoo | DisrespectingTeacher
            | LeavingCampus | FightingThreatFilming | TrafficViolation | SittingOnDesk
            | SittingTeacherDeskRailing | AlcoholTobacco | FlammableMaterials
            | InappropriateMedia | PropertyDamage | PropertyRemoval | ExamCheating
            | Profanity | PhoneUse => ViolationGroup::ProhibitedActs,
            ReturnedLostProperty | AllPeriodsRankA | HelpfulTip | PerfectAttendance
            | FullMovementParticipation | FirstPrize | SecondPrize | ThirdPrize
            | ConsolationPrize | PublishedArticle | VolunteerLabor | OnlineContestFull
            | OnlineContestHigh | OnlineContestMid | OnlineContestLow => {
                ViolationGroup::Commendation
            }
            ManualAdjustment => ViolationGroup::Adjustment,
        }
    }

    /// Class-collective fault kinds. These deduplicate by (kind, day) in
    /// weekly scoring and land in the collective deduction bucket.
    pub fn is_class_fault(self) -> bool {
        use ViolationKind::*;
        matches!(
            self,
            PeriodB
                | PeriodC
                | PeriodD
                | PeriodUnrated
                | RollCountNotRecorded
                | RollCountNotFinalized
                | HomeroomDisorderClass
                | SlowAssemblyClass
                | ChairsNotStowed
                | DoorsLightsLeftOn
                | MisparkedBikeClass
                | DisorderlyClass
                | LateCleaningDuty
                | CleaningDutySkipped
                | LaborDutySkipped
                | WeeklyDutyUnfinished
                | MissingClassSupplies
                | LitteringAssemblyArea
                | MissingFlowersSlogan
                | OnlineContestFull
                | OnlineContestHigh
                | OnlineContestMid
                | OnlineContestLow
        )
    }

    /// Severe violations that demote the classification one level
    /// regardless of the point total.
    pub fn is_prohibited(self) -> bool {
        use ViolationKind::*;
        matches!(
            self,
            DisrespectingTeacher
                | FightingThreatFilming
                | AlcoholTobacco
                | FlammableMaterials
                | InappropriateMedia
                | DrinkingWaterVandalism
                | Graffiti
                | PropertyDamage
                | PropertyRemoval
                | ExamCheating
        )
    }

    /// Kinds that suppress the weekly "100% period A" auto-bonus.
    pub fn is_bad_period(self) -> bool {
        use ViolationKind::*;
        matches!(self, PeriodB | PeriodC | PeriodD | PeriodUnrated)
    }

    /// Kinds that suppress the weekly attendance auto-bonus.
    pub fn is_bad_attendance(self) -> bool {
        use ViolationKind::*;
        matches!(
            self,
            UnexcusedAbsence | ClassCutting | LateArrival | SkippedAssembly
        )
    }

    /// Manually-entered twins of the automatic weekly bonuses. Skipped
    /// outright when tallying so the rule cannot double-count.
    pub fn is_auto_bonus_duplicate(self) -> bool {
        use ViolationKind::*;
        matches!(self, AllPeriodsRankA | PerfectAttendance)
    }
}

/// A per-class-period quality grade from the discipline logbook. A is the
/// baseline and produces no record; B/C/D map onto the period fault kinds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString, EnumIter,
)]
pub enum PeriodRank {
    A,
    B,
    C,
    D,
}

impl PeriodRank {
    pub fn fault_kind(self) -> Option<ViolationKind> {
        match self {
            PeriodRank::A => None,
            PeriodRank::B => Some(ViolationKind::PeriodB),
            PeriodRank::C => Some(ViolationKind::PeriodC),
            PeriodRank::D => Some(ViolationKind::PeriodD),
        }
    }
}

impl Serialize for PeriodRank {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_ref())
    }
}

impl<'de> Deserialize<'de> for PeriodRank {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse()
            .map_err(|_| serde::de::Error::custom(format!("unknown period rank: {raw}")))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    #[serde(rename = "type")]
    pub kind: ViolationKind,
    pub points: i64,
    pub group: ViolationGroup,
    pub class_fault: bool,
    pub prohibited: bool,
}

/// The full catalog in declaration order, for pickers and exports.
pub fn catalog_entries() -> Vec<CatalogEntry> {
    ViolationKind::iter()
        .map(|kind| CatalogEntry {
            kind,
            points: kind.points(),
            group: kind.group(),
            class_fault: kind.is_class_fault(),
            prohibited: kind.is_prohibited(),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentPreset {
    pub label: &'static str,
    pub points: i64,
    pub description: &'static str,
}

/// Suggested criteria for manual point adjustments, as printed in the
/// school's merit-point guideline sheet.
pub fn adjustment_presets() -> Vec<AdjustmentPreset> {
    vec![
        AdjustmentPreset {
            label: "Lớp đạt 100% giờ A",
            points: 40,
            description: "Tập thể lớp đạt 100% tiết học xếp loại A trong tuần",
        },
        AdjustmentPreset {
            label: "Duy trì sĩ số tốt",
            points: 15,
            description: "100% học sinh không vắng học, trễ học, trốn học trong tuần",
        },
        AdjustmentPreset {
            label: "100% tham gia phong trào",
            points: 20,
            description: "100% học sinh tham gia các hoạt động phong trào",
        },
        AdjustmentPreset {
            label: "Phong trào: Giải Nhất",
            points: 30,
            description: "Đạt giải Nhất trong hội thi cấp trường",
        },
        AdjustmentPreset {
            label: "Phong trào: Giải Nhì",
            points: 20,
            description: "Đạt giải Nhì trong hội thi cấp trường",
        },
        AdjustmentPreset {
            label: "Phong trào: Giải Ba",
            points: 15,
            description: "Đạt giải Ba trong hội thi cấp trường",
        },
        AdjustmentPreset {
            label: "Phong trào: Giải Khuyến khích",
            points: 10,
            description: "Đạt giải Khuyến khích trong hội thi cấp trường",
        },
        AdjustmentPreset {
            label: "Nhặt được của rơi",
            points: 20,
            description: "Gương người tốt việc tốt: Nhặt được của rơi trả lại người mất",
        },
        AdjustmentPreset {
            label: "Báo tin có lợi",
            points: 10,
            description: "Có công báo lại thông tin có lợi để ngăn chặn hành vi xấu",
        },
        AdjustmentPreset {
            label: "Lao động tình nguyện",
            points: 15,
            description: "Tập thể lớp đăng ký lao động tình nguyện",
        },
        AdjustmentPreset {
            label: "Viết bài đăng báo/fanpage",
            points: 30,
            description: "Học sinh viết bài, sáng tác được đăng tải trên các phương tiện truyền thông",
        },
        AdjustmentPreset {
            label: "Thi online: 100% tham gia",
            points: 30,
            description: "Lớp có 100% học sinh tham gia các cuộc thi online",
        },
        AdjustmentPreset {
            label: "Thi online: 80-100% tham gia",
            points: 20,
            description: "Lớp có 80% đến dưới 100% học sinh tham gia",
        },
        AdjustmentPreset {
            label: "Thi online: 50-80% tham gia",
            points: 15,
            description: "Lớp có 50% đến dưới 80% học sinh tham gia",
        },
        AdjustmentPreset {
            label: "Thi online: < 50% tham gia",
            points: -20,
            description: "Lớp có dưới 50% học sinh tham gia các cuộc thi online",
        },
        AdjustmentPreset {
            label: "Không hoàn thành trực tuần",
            points: -20,
            description: "Lớp không hoàn thành nhiệm vụ trực tuần được giao",
        },
        AdjustmentPreset {
            label: "Không lao động nghiêm túc",
            points: -30,
            description: "Lớp không tham gia lao động hoặc làm không nghiêm túc",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_through_serde() {
        for kind in ViolationKind::iter() {
            let json = serde_json::to_string(&kind).expect("serialize");
            let back: ViolationKind = serde_json::from_str(&json).expect("deserialize");
            assert_eq!(back, kind);
        }
    }

    #[test]
    fn point_table_spot_checks() {
        assert_eq!(ViolationKind::PeriodB.points(), -5);
        assert_eq!(ViolationKind::PeriodC.points(), -10);
        assert_eq!(ViolationKind::ExcusedAbsence.points(), -2);
        assert_eq!(ViolationKind::DisrespectingTeacher.points(), -50);
        assert_eq!(ViolationKind::AllPeriodsRankA.points(), 40);
        assert_eq!(ViolationKind::PerfectAttendance.points(), 15);
        assert_eq!(ViolationKind::OnlineContestLow.points(), -20);
        assert_eq!(ViolationKind::ManualAdjustment.points(), 0);
    }

    #[test]
    fn class_fault_membership() {
        assert!(ViolationKind::PeriodC.is_class_fault());
        assert!(ViolationKind::CleaningDutySkipped.is_class_fault());
        assert!(ViolationKind::OnlineContestFull.is_class_fault());
        assert!(!ViolationKind::PhoneUse.is_class_fault());
        assert!(!ViolationKind::UnexcusedAbsence.is_class_fault());
        let count = ViolationKind::iter().filter(|k| k.is_class_fault()).count();
        assert_eq!(count, 23);
    }

    #[test]
    fn prohibited_membership() {
        assert!(ViolationKind::ExamCheating.is_prohibited());
        assert!(ViolationKind::Graffiti.is_prohibited());
        assert!(!ViolationKind::DyedHairPiercingTattoo.is_prohibited());
        assert!(!ViolationKind::PhoneUse.is_prohibited());
        let count = ViolationKind::iter().filter(|k| k.is_prohibited()).count();
        assert_eq!(count, 10);
    }

    #[test]
    fn rank_letters_map_to_period_faults() {
        assert_eq!(PeriodRank::A.fault_kind(), None);
        assert_eq!(PeriodRank::B.fault_kind(), Some(ViolationKind::PeriodB));
        assert_eq!(PeriodRank::D.fault_kind(), Some(ViolationKind::PeriodD));
        let rank: PeriodRank = serde_json::from_str("\"C\"").expect("parse");
        assert_eq!(rank, PeriodRank::C);
    }

    #[test]
    fn catalog_lists_every_kind_once() {
        let entries = catalog_entries();
        assert_eq!(entries.len(), ViolationKind::iter().count());
        let unknown: Result<ViolationKind, _> = "Tiết E".parse();
        assert!(unknown.is_err());
    }
}
