// Utilitaires DSP - Hygiène audio et conversions de niveau
//
// Ce module contient les fonctions utilisées dans le callback temps-réel
// et par les effets (compresseur, bus master).

/// Plancher utilisé pour les conversions en dB (silence numérique)
pub const MIN_DB: f32 = -120.0;

/// Flush denormals to zero (anti-dénormaux)
///
/// Les nombres dénormaux (très proches de 0) peuvent causer des ralentissements CPU
/// importants sur certains processeurs. Cette fonction force les très petites valeurs
/// à zéro pour éviter ce problème.
///
/// Seuil: 1e-15 (largement sous le bruit numérique à 32-bit float)
#[inline]
pub fn flush_denormals_to_zero(x: f32) -> f32 {
    if x.abs() < 1e-15 {
        0.0
    } else {
        x
    }
}

/// Soft clipping avec tanh (saturation douce)
///
/// Limite doucement la sortie audio dans [-1, 1] sans créer de distorsion dure.
/// Les voix empilées (pas de limite de polyphonie) peuvent dépasser 1.0 sur le bus.
#[inline]
pub fn soft_clip(x: f32) -> f32 {
    x.tanh()
}

/// Linear gain to decibels, floored at [`MIN_DB`]
#[inline]
pub fn gain_to_db(gain: f32) -> f32 {
    if gain <= 0.0 {
        MIN_DB
    } else {
        (20.0 * gain.log10()).max(MIN_DB)
    }
}

/// Decibels to linear gain
#[inline]
pub fn db_to_gain(db: f32) -> f32 {
    10.0f32.powf(db / 20.0)
}

/// Smoother 1-pole (filtre passe-bas du 1er ordre)
///
/// Smooth les changements brusques de paramètres pour éviter les clics/pops.
///
/// Formule: y[n] = y[n-1] + α * (x[n] - y[n-1])
pub struct OnePoleSmoother {
    current: f32,
    coefficient: f32,
}

impl OnePoleSmoother {
    /// Crée un nouveau smoother
    ///
    /// # Arguments
    /// * `initial_value` - Valeur de départ
    /// * `time_constant_ms` - Temps pour atteindre ~63% de la cible (en millisecondes)
    /// * `sample_rate` - Sample rate en Hz
    pub fn new(initial_value: f32, time_constant_ms: f32, sample_rate: f32) -> Self {
        let time_constant_samples = time_constant_ms * 0.001 * sample_rate;
        let coefficient = if time_constant_samples > 0.0 {
            1.0 / time_constant_samples
        } else {
            1.0
        };

        Self {
            current: initial_value,
            coefficient: coefficient.min(1.0),
        }
    }

    #[inline]
    pub fn process(&mut self, target: f32) -> f32 {
        self.current += self.coefficient * (target - self.current);
        self.current = flush_denormals_to_zero(self.current);
        self.current
    }
}
